//! In-memory stand-ins for the hardware traits.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use periph::hal::dma::{ChannelBinding, DmaController};
use periph::hal::interrupt::{InterruptFlags, InterruptSource, Priority, SourceId};
use periph::hal::usb::{UsbHardware, UsbSpeed};

// ============================================================================
// Handler call log
// ============================================================================

thread_local! {
    static CALLS: RefCell<Vec<(&'static str, u32)>> = const { RefCell::new(Vec::new()) };
}

pub fn record(name: &'static str, bits: u32) {
    CALLS.with(|calls| calls.borrow_mut().push((name, bits)));
}

pub fn take_calls() -> Vec<(&'static str, u32)> {
    CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
}

// ============================================================================
// Interrupt source
// ============================================================================

/// Status word that only changes through `clear`, like a write-1-to-clear
/// status register.
pub struct FakeSource {
    pub id: SourceId,
    pub pending: u32,
    pub status_reads: usize,
    pub acknowledged: usize,
}

impl FakeSource {
    pub fn new(id: SourceId, pending: u32) -> Self {
        Self {
            id,
            pending,
            status_reads: 0,
            acknowledged: 0,
        }
    }
}

impl InterruptSource for FakeSource {
    fn source(&self) -> SourceId {
        self.id
    }

    fn status(&mut self) -> u32 {
        self.status_reads += 1;
        self.pending
    }

    fn clear(&mut self, bits: u32) {
        self.pending &= !bits;
    }

    fn acknowledge(&mut self) {
        self.acknowledged += 1;
    }
}

// ============================================================================
// DMA controller
// ============================================================================

pub const DMA_CHANNELS: usize = 24;

/// Controller whose global enable register only moves through set/clear
/// writes.
pub struct MockDma {
    pub enabled: Cell<u32>,
    pub unmasked: Cell<u32>,
    pub address: [Cell<usize>; DMA_CHANNELS],
    pub remaining: [Cell<u32>; DMA_CHANNELS],
    pub done_irq: [Cell<bool>; DMA_CHANNELS],
    pub events: [Cell<InterruptFlags>; DMA_CHANNELS],
    pub irq_priority: Cell<Option<Priority>>,
}

impl MockDma {
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(0),
            unmasked: Cell::new(0),
            address: std::array::from_fn(|_| Cell::new(0)),
            remaining: std::array::from_fn(|_| Cell::new(0)),
            done_irq: std::array::from_fn(|_| Cell::new(false)),
            events: std::array::from_fn(|_| Cell::new(InterruptFlags::empty())),
            irq_priority: Cell::new(None),
        }
    }

    pub fn is_enabled(&self, binding: &ChannelBinding) -> bool {
        self.enabled.get() & binding.bit() != 0
    }

    /// Run the binding's transfer to the end and raise its completion.
    pub fn finish(&self, binding: &ChannelBinding, done: InterruptFlags) {
        let ch = binding.channel as usize;
        let left = self.remaining[ch].replace(0);
        self.address[ch].set(self.address[ch].get() + left as usize);
        self.events[ch].set(done);
    }
}

impl DmaController for MockDma {
    const CHANNEL_COUNT: u8 = DMA_CHANNELS as u8;

    fn enable_channels(&self, mask: u32) {
        self.enabled.set(self.enabled.get() | mask);
    }

    fn disable_channels(&self, mask: u32) {
        self.enabled.set(self.enabled.get() & !mask);
    }

    fn enabled_channels(&self) -> u32 {
        self.enabled.get()
    }

    fn unmask_channels(&self, mask: u32) {
        self.unmasked.set(self.unmasked.get() | mask);
    }

    fn mask_channels(&self, mask: u32) {
        self.unmasked.set(self.unmasked.get() & !mask);
    }

    fn pending_channels(&self) -> u32 {
        let mut pending = 0;
        for (ch, events) in self.events.iter().enumerate() {
            if !events.get().is_empty() {
                pending |= 1 << ch;
            }
        }
        pending & self.unmasked.get()
    }

    fn configure(&self, binding: &ChannelBinding) {
        let ch = binding.channel as usize;
        self.address[ch].set(0);
        self.remaining[ch].set(0);
    }

    fn set_transfer(&self, binding: &ChannelBinding, address: usize, length: u32) {
        let ch = binding.channel as usize;
        self.address[ch].set(address);
        self.remaining[ch].set(length);
    }

    fn position(&self, binding: &ChannelBinding) -> usize {
        self.address[binding.channel as usize].get()
    }

    fn remaining(&self, binding: &ChannelBinding) -> u32 {
        self.remaining[binding.channel as usize].get()
    }

    fn set_remaining(&self, binding: &ChannelBinding, length: u32) {
        self.remaining[binding.channel as usize].set(length);
    }

    fn enable_done_interrupt(&self, binding: &ChannelBinding) {
        self.done_irq[binding.channel as usize].set(true);
    }

    fn disable_done_interrupt(&self, binding: &ChannelBinding) {
        self.done_irq[binding.channel as usize].set(false);
    }

    fn take_events(&self, binding: &ChannelBinding) -> InterruptFlags {
        self.events[binding.channel as usize].replace(InterruptFlags::empty())
    }

    fn request_flush(&self, _mask: u32) {}

    fn enable_irq(&self, priority: Option<Priority>) {
        self.irq_priority.set(priority);
    }
}

/// The controller's shared line as a registry source.
pub struct DmaLine<'a>(pub &'a MockDma);

impl InterruptSource for DmaLine<'_> {
    fn source(&self) -> SourceId {
        SourceId::Dma
    }

    fn status(&mut self) -> u32 {
        self.0.pending_channels()
    }

    fn clear(&mut self, bits: u32) {
        for ch in 0..DMA_CHANNELS {
            if bits & (1 << ch) != 0 {
                self.0.events[ch].set(InterruptFlags::empty());
            }
        }
    }

    fn acknowledge(&mut self) {}
}

// ============================================================================
// USB controller
// ============================================================================

/// Device port that records everything pushed out of endpoint 0.
pub struct CaptureUsb {
    pub sent: Vec<u8>,
    pub writes: usize,
    pub speed: UsbSpeed,
}

impl CaptureUsb {
    pub fn at(speed: UsbSpeed) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }
}

impl Default for CaptureUsb {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            writes: 0,
            speed: UsbSpeed::Full,
        }
    }
}

impl UsbHardware for CaptureUsb {
    const ENDPOINT_COUNT: u8 = 10;
    const CONTROL_ENDPOINT_SIZE: u8 = 64;

    fn speed(&self) -> UsbSpeed {
        self.speed
    }

    fn write_control(&mut self, data: &[u8]) -> usize {
        self.writes += 1;
        self.sent.extend_from_slice(data);
        data.len()
    }
}
