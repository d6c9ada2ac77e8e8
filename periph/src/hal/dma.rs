//! DMA Controller Hardware Abstraction Layer.
//!
//! A DMA controller here is a bank of numbered channels sharing global
//! enable, disable and interrupt-mask registers. Those global registers are
//! write-one-to-set / write-one-to-clear, so touching one channel never
//! disturbs another; every method below takes `&self` for that reason.

use super::interrupt::{InterruptFlags, Priority};

/// Transfer direction as seen from the peripheral.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Memory to peripheral.
    Tx,
    /// Peripheral to memory.
    Rx,
}

/// Fixed wiring of one (peripheral, direction) pair to the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    /// Physical channel index.
    pub channel: u8,
    /// Hardware request line (peripheral id) that paces the channel.
    pub request_line: u8,
    /// Address of the peripheral data register.
    pub register: usize,
    pub direction: Direction,
}

impl ChannelBinding {
    pub const fn tx(channel: u8, request_line: u8, register: usize) -> Self {
        Self {
            channel,
            request_line,
            register,
            direction: Direction::Tx,
        }
    }

    pub const fn rx(channel: u8, request_line: u8, register: usize) -> Self {
        Self {
            channel,
            request_line,
            register,
            direction: Direction::Rx,
        }
    }

    /// This channel's bit in the controller's global registers.
    #[inline]
    pub const fn bit(&self) -> u32 {
        1 << self.channel
    }
}

/// A peripheral that can be driven by DMA.
///
/// Only peripherals with an implementation can be handed to the channel
/// engine, so an unsupported pairing fails to build.
pub trait DmaPeripheral {
    const NAME: &'static str;
    const TX: ChannelBinding;
    /// `None` for peripherals that only transmit.
    const RX: Option<ChannelBinding>;
}

/// Register-level access to a DMA controller.
pub trait DmaController {
    /// Number of physical channels.
    const CHANNEL_COUNT: u8;

    /// Start the channels in `mask`.
    fn enable_channels(&self, mask: u32);

    /// Stop the channels in `mask`.
    fn disable_channels(&self, mask: u32);

    /// Channels currently running.
    fn enabled_channels(&self) -> u32;

    /// Let the channels in `mask` raise the controller interrupt.
    fn unmask_channels(&self, mask: u32);

    fn mask_channels(&self, mask: u32);

    /// Channels with a pending interrupt.
    fn pending_channels(&self) -> u32;

    /// Program the channel configuration and the fixed peripheral-side
    /// address. The memory-side address is reset to zero.
    fn configure(&self, binding: &ChannelBinding);

    /// Program the memory-side address and the transfer length.
    fn set_transfer(&self, binding: &ChannelBinding, address: usize, length: u32);

    /// Current memory-side address.
    fn position(&self, binding: &ChannelBinding) -> usize;

    /// Units still to transfer.
    fn remaining(&self, binding: &ChannelBinding) -> u32;

    fn set_remaining(&self, binding: &ChannelBinding, length: u32);

    fn enable_done_interrupt(&self, binding: &ChannelBinding);

    fn disable_done_interrupt(&self, binding: &ChannelBinding);

    /// Read and clear the channel's interrupt status, reported as
    /// transfer-done and error events for the binding's direction.
    fn take_events(&self, binding: &ChannelBinding) -> InterruptFlags;

    /// Ask the channels in `mask` to flush their FIFOs to memory.
    /// Does not wait.
    fn request_flush(&self, mask: u32);

    /// Enable the controller's line at the interrupt controller, optionally
    /// setting its priority first.
    fn enable_irq(&self, priority: Option<Priority>);
}
