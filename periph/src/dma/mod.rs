//! DMA channel engine.
//!
//! A [`DmaEngine`] drives the transmit and receive channels that the
//! [`DmaPeripheral`] binding assigns to one peripheral. The channel numbers
//! are constants of the binding, so two engines never share a channel and
//! no allocation happens at runtime.
//!
//! Transmit-only peripherals have no receive binding. Their engines still
//! build, but any receive operation on them does not:
//!
//! ```compile_fail
//! use periph::dma::DmaEngine;
//! use periph::platform::sams70::xdmac::{Pwm, Xdmac};
//!
//! static XDMAC: Xdmac = unsafe { Xdmac::new() };
//! static PWM: DmaEngine<'static, Xdmac, Pwm<0>> = DmaEngine::new(&XDMAC);
//!
//! static mut SAMPLES: [u8; 8] = [0; 8];
//! PWM.receive(unsafe { &mut *core::ptr::addr_of_mut!(SAMPLES) });
//! ```
//!
//! Neither does an engine for a peripheral without a binding:
//!
//! ```compile_fail
//! use periph::dma::DmaEngine;
//! use periph::platform::sams70::xdmac::{Spi, Xdmac};
//!
//! static XDMAC: Xdmac = unsafe { Xdmac::new() };
//! static SPI2: DmaEngine<'static, Xdmac, Spi<2>> = DmaEngine::new(&XDMAC);
//! ```
//!
//! Completion is reported only through the controller's interrupt: hook a
//! handler up with [`DmaEngine::register_completion`] and ask the engine
//! what happened with [`DmaEngine::completion_events`].

use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use log::{debug, trace};

use crate::hal::dma::{ChannelBinding, Direction, DmaController, DmaPeripheral};
use crate::hal::interrupt::InterruptFlags;
use crate::irq::{Handler, Registry, RegistryError};

/// Snapshot of one sub-channel as last programmed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub binding: ChannelBinding,
    pub buffer: usize,
    pub length: u32,
    pub done_interrupt: bool,
}

struct SubChannel {
    buffer: AtomicUsize,
    length: AtomicU32,
    done_interrupt: AtomicBool,
}

impl SubChannel {
    const fn new() -> Self {
        Self {
            buffer: AtomicUsize::new(0),
            length: AtomicU32::new(0),
            done_interrupt: AtomicBool::new(false),
        }
    }

    fn record(&self, buffer: usize, length: u32) {
        self.buffer.store(buffer, Ordering::Relaxed);
        self.length.store(length, Ordering::Relaxed);
    }

    fn snapshot(&self, binding: ChannelBinding) -> ChannelState {
        ChannelState {
            binding,
            buffer: self.buffer.load(Ordering::Relaxed),
            length: self.length.load(Ordering::Relaxed),
            done_interrupt: self.done_interrupt.load(Ordering::Relaxed),
        }
    }
}

/// Transmit and receive channels of peripheral `P` on controller `C`.
pub struct DmaEngine<'c, C: DmaController, P: DmaPeripheral> {
    controller: &'c C,
    tx: SubChannel,
    rx: SubChannel,
    _peripheral: PhantomData<P>,
}

impl<'c, C: DmaController, P: DmaPeripheral> DmaEngine<'c, C, P> {
    const TX: ChannelBinding = P::TX;

    /// Naming this for a transmit-only peripheral fails the build.
    const RX: ChannelBinding = match P::RX {
        Some(binding) => binding,
        None => panic!("peripheral has no receive channel"),
    };

    const RX_BIT: u32 = match P::RX {
        Some(binding) => binding.bit(),
        None => 0,
    };

    pub const fn new(controller: &'c C) -> Self {
        const {
            assert!(P::TX.channel < C::CHANNEL_COUNT, "TX channel out of range");
            assert!(matches!(P::TX.direction, Direction::Tx), "TX binding points the wrong way");
            if let Some(rx) = P::RX {
                assert!(rx.channel < C::CHANNEL_COUNT, "RX channel out of range");
                assert!(P::TX.channel != rx.channel, "TX and RX share a channel");
                assert!(matches!(rx.direction, Direction::Rx), "RX binding points the wrong way");
            }
        };

        Self {
            controller,
            tx: SubChannel::new(),
            rx: SubChannel::new(),
            _peripheral: PhantomData,
        }
    }

    pub const fn tx_binding(&self) -> ChannelBinding {
        Self::TX
    }

    pub const fn rx_binding(&self) -> Option<ChannelBinding> {
        P::RX
    }

    /// Controller bits of every channel the peripheral owns.
    pub const fn channel_mask(&self) -> u32 {
        Self::TX.bit() | Self::RX_BIT
    }

    /// Last programmed state of one direction, `None` if the peripheral
    /// has no channel for it.
    pub fn state(&self, direction: Direction) -> Option<ChannelState> {
        match direction {
            Direction::Tx => Some(self.tx.snapshot(Self::TX)),
            Direction::Rx => P::RX.map(|binding| self.rx.snapshot(binding)),
        }
    }

    /// Stop the channels and reprogram them from the binding.
    pub fn reset(&self) {
        self.reset_channel(&Self::TX, &self.tx);
        if let Some(rx) = P::RX {
            self.reset_channel(&rx, &self.rx);
        }
        debug!("{} DMA reset: channels {:#010x}", P::NAME, self.channel_mask());
    }

    fn reset_channel(&self, binding: &ChannelBinding, sub: &SubChannel) {
        self.controller.disable_channels(binding.bit());
        self.controller.configure(binding);
        self.controller.unmask_channels(binding.bit());
        sub.record(0, 0);
    }

    pub fn enable(&self) {
        self.controller.enable_channels(self.channel_mask());
    }

    pub fn disable(&self) {
        self.controller.disable_channels(self.channel_mask());
    }

    pub fn enable_tx(&self) {
        self.controller.enable_channels(Self::TX.bit());
    }

    pub fn disable_tx(&self) {
        self.controller.disable_channels(Self::TX.bit());
    }

    pub fn enable_rx(&self) {
        self.controller.enable_channels(Self::RX.bit());
    }

    pub fn disable_rx(&self) {
        self.controller.disable_channels(Self::RX.bit());
    }

    /// Choose which sub-channels report completion.
    ///
    /// `TX_TRANSFER_DONE` and `RX_TRANSFER_DONE` select the sub-channels,
    /// a priority bit sets the controller line priority, and
    /// [`InterruptFlags::OFF`] silences both.
    pub fn set_interrupts(&self, flags: InterruptFlags) {
        self.controller.enable_irq(flags.priority());

        self.notify_on_done(
            &Self::TX,
            &self.tx,
            flags.contains(InterruptFlags::TX_TRANSFER_DONE),
        );
        if let Some(rx) = P::RX {
            self.notify_on_done(&rx, &self.rx, flags.contains(InterruptFlags::RX_TRANSFER_DONE));
        }
    }

    fn notify_on_done(&self, binding: &ChannelBinding, sub: &SubChannel, wanted: bool) {
        if wanted {
            self.controller.enable_done_interrupt(binding);
        } else {
            self.controller.disable_done_interrupt(binding);
        }
        sub.done_interrupt.store(wanted, Ordering::Relaxed);
    }

    /// Start sending `length` bytes from `buffer`.
    ///
    /// Returns `false` without touching the channel while a previous
    /// transfer still has bytes left, and `false` after loading an empty
    /// transfer.
    ///
    /// # Safety
    ///
    /// `buffer` must stay valid and unmodified for `length` bytes until the
    /// transfer completes or is stopped.
    pub unsafe fn start_tx(&self, buffer: *const u8, length: u32) -> bool {
        if !self.done_writing() {
            return false;
        }

        let notify = self.tx.done_interrupt.load(Ordering::Relaxed);
        self.disable_tx();
        if notify {
            self.controller.disable_done_interrupt(&Self::TX);
        }
        self.controller.set_transfer(&Self::TX, buffer as usize, length);
        self.tx.record(buffer as usize, length);

        if length == 0 {
            return false;
        }

        if notify {
            self.controller.enable_done_interrupt(&Self::TX);
        }
        self.enable_tx();
        trace!("{} DMA tx {} bytes from {:p}", P::NAME, length, buffer);
        true
    }

    /// Start receiving up to `length` bytes into `buffer`.
    ///
    /// When the channel is idle this loads a new transfer. When it is
    /// already writing inside `[buffer, buffer + length)` the running
    /// transfer is stretched to end at `buffer + length` instead.
    /// Any other busy state returns `false`.
    ///
    /// # Safety
    ///
    /// `buffer` must stay valid for `length` bytes and must not be read
    /// past the reported position until the transfer completes or is
    /// stopped.
    pub unsafe fn start_rx(&self, buffer: *mut u8, length: u32) -> bool {
        if length == 0 {
            return false;
        }

        let notify = self.rx.done_interrupt.load(Ordering::Relaxed);
        let start = buffer as usize;
        let end = start + length as usize;

        if self.done_reading() {
            self.disable_rx();
            if notify {
                self.controller.disable_done_interrupt(&Self::RX);
            }
            self.controller.set_transfer(&Self::RX, start, length);
            self.rx.record(start, length);
            self.enable_rx();
            if notify {
                self.controller.enable_done_interrupt(&Self::RX);
            }
            trace!("{} DMA rx {} bytes into {:p}", P::NAME, length, buffer);
            return true;
        }

        let position = self.controller.position(&Self::RX);
        if !(start..end).contains(&position) {
            return false;
        }

        if notify {
            self.controller.disable_done_interrupt(&Self::RX);
        }
        // The channel keeps running while the new length is computed, so
        // retry until the position is stable across the update.
        let mut saved = position;
        loop {
            self.controller
                .set_remaining(&Self::RX, end.saturating_sub(saved) as u32);
            let now = self.controller.position(&Self::RX);
            if now <= saved {
                break;
            }
            saved = now;
        }
        self.rx.record(start, length);
        self.enable_rx();
        if notify {
            self.controller.enable_done_interrupt(&Self::RX);
        }
        trace!("{} DMA rx extended to {} bytes from {:p}", P::NAME, length, buffer);
        true
    }

    /// Send a buffer that lives for the whole program.
    pub fn send(&self, data: &'static [u8]) -> bool {
        let Ok(length) = u32::try_from(data.len()) else {
            return false;
        };
        // SAFETY: 'static and shared, so never freed or written.
        unsafe { self.start_tx(data.as_ptr(), length) }
    }

    /// Receive into a buffer that lives for the whole program.
    ///
    /// The engine keeps writing into `buffer` after this returns; progress
    /// is visible through [`rx_position`](Self::rx_position).
    pub fn receive(&self, buffer: &'static mut [u8]) -> bool {
        let Ok(length) = u32::try_from(buffer.len()) else {
            return false;
        };
        // SAFETY: the unique 'static borrow is consumed here.
        unsafe { self.start_rx(buffer.as_mut_ptr(), length) }
    }

    pub fn left_to_write(&self) -> u32 {
        self.controller.remaining(&Self::TX)
    }

    pub fn done_writing(&self) -> bool {
        self.left_to_write() == 0
    }

    pub fn left_to_read(&self) -> u32 {
        self.controller.remaining(&Self::RX)
    }

    pub fn done_reading(&self) -> bool {
        self.left_to_read() == 0
    }

    /// Abandon the rest of the current receive.
    pub fn flush_read(&self) {
        self.controller.set_remaining(&Self::RX, 0);
    }

    /// Address of the next byte to be sent.
    pub fn tx_position(&self) -> usize {
        self.controller.position(&Self::TX)
    }

    /// Address of the next byte to be received. Requests a FIFO flush
    /// first but does not wait for it.
    pub fn rx_position(&self) -> usize {
        self.controller.request_flush(Self::RX.bit());
        self.controller.position(&Self::RX)
    }

    /// Halt the transmit channel, drop what it had left and discard its
    /// pending completion. The channel is idle afterwards and the next
    /// `start_tx` is accepted; completion notification stays as chosen by
    /// [`set_interrupts`](Self::set_interrupts).
    pub fn stop_tx(&self) {
        self.disable_tx();
        self.controller.disable_done_interrupt(&Self::TX);
        self.controller.set_remaining(&Self::TX, 0);
        self.controller.take_events(&Self::TX);
    }

    /// Receive counterpart of [`stop_tx`](Self::stop_tx).
    pub fn stop_rx(&self) {
        self.disable_rx();
        self.controller.disable_done_interrupt(&Self::RX);
        self.controller.set_remaining(&Self::RX, 0);
        self.controller.take_events(&Self::RX);
    }

    /// Route this engine's channel interrupts to `handler`.
    pub fn register_completion<R: Registry>(
        &self,
        registry: &R,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        registry.register(self.channel_mask(), handler)
    }

    /// Decode the channel bits a completion handler was given.
    pub fn completion_events(&self, channels: u32) -> InterruptFlags {
        let mut events = InterruptFlags::empty();
        if channels & Self::TX.bit() != 0 {
            events |= self.controller.take_events(&Self::TX);
        }
        if let Some(rx) = P::RX {
            if channels & rx.bit() != 0 {
                events |= self.controller.take_events(&rx);
            }
        }
        events
    }
}
