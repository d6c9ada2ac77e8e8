//! Interrupt Controller Hardware Abstraction Layer.
//!
//! Two levels are modelled here. [`InterruptController`] is the core
//! controller (NVIC on Cortex-M) that masks, unmasks and prioritises whole
//! interrupt lines. [`InterruptSource`] is one peripheral that owns such a
//! line and multiplexes many events onto it through a status register.

use bitflags::bitflags;
use core::fmt;

/// Interrupt number type.
pub type IrqNumber = u32;

/// Interrupt priority level.
///
/// Lower values are more urgent, as on the NVIC.
pub type Priority = u8;

/// Interrupt controller trait.
pub trait InterruptController {
    /// Error type for interrupt controller operations.
    type Error: fmt::Debug;

    /// Enable (unmask) an interrupt line.
    fn enable(&mut self, irq: IrqNumber) -> Result<(), Self::Error>;

    /// Disable (mask) an interrupt line.
    fn disable(&mut self, irq: IrqNumber) -> Result<(), Self::Error>;

    /// Check if an interrupt is currently pending.
    fn is_pending(&self, irq: IrqNumber) -> Result<bool, Self::Error>;

    /// Clear a pending interrupt so it does not fire again on exit.
    fn clear_pending(&mut self, irq: IrqNumber) -> Result<(), Self::Error>;
}

/// Extension trait for interrupt controllers with priority support.
pub trait PriorityInterruptController: InterruptController {
    /// Set the priority of an interrupt line.
    fn set_priority(&mut self, irq: IrqNumber, priority: Priority) -> Result<(), Self::Error>;

    /// Get the priority of an interrupt line.
    fn get_priority(&self, irq: IrqNumber) -> Result<Priority, Self::Error>;
}

/// Which shared interrupt a source stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceId {
    /// GPIO port, by letter.
    Port(char),
    /// ADC unit.
    Adc(u8),
    /// UART unit.
    Uart(u8),
    /// The DMA controller.
    Dma,
    /// Any other line, by number.
    Line(IrqNumber),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Port(letter) => write!(f, "PIO{}", letter),
            SourceId::Adc(unit) => write!(f, "ADC{}", unit),
            SourceId::Uart(unit) => write!(f, "UART{}", unit),
            SourceId::Dma => f.write_str("DMA"),
            SourceId::Line(irq) => write!(f, "IRQ{}", irq),
        }
    }
}

/// A peripheral whose events share one interrupt line.
///
/// A dispatch reads [`status`](Self::status) exactly once, runs the
/// matching handlers, [`clear`](Self::clear)s what it handled and then
/// [`acknowledge`](Self::acknowledge)s the line at the controller.
pub trait InterruptSource {
    fn source(&self) -> SourceId;

    /// Snapshot of the pending event bits.
    fn status(&mut self) -> u32;

    /// Clear the given pending bits and nothing else.
    ///
    /// Sources whose status register clears on read implement this as a
    /// no-op.
    fn clear(&mut self, bits: u32);

    /// Clear the pending state of the line at the interrupt controller.
    fn acknowledge(&mut self);
}

bitflags! {
    /// Interrupt options for peripherals.
    ///
    /// Event bits select what to be notified about; at most one priority
    /// bit picks the line priority. [`InterruptFlags::OFF`] disables
    /// everything.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct InterruptFlags: u32 {
        const TX_READY = 1 << 0;
        const TX_DONE = 1 << 1;
        const TX_ERROR = 1 << 2;
        const RX_READY = 1 << 3;
        const RX_DONE = 1 << 4;
        const RX_ERROR = 1 << 5;
        const TX_TRANSFER_DONE = 1 << 6;
        const RX_TRANSFER_DONE = 1 << 7;

        const PRIORITY_HIGHEST = 1 << 11;
        const PRIORITY_HIGH = 1 << 12;
        const PRIORITY_MEDIUM = 1 << 13;
        const PRIORITY_LOW = 1 << 14;
        const PRIORITY_LOWEST = 1 << 15;
    }
}

impl InterruptFlags {
    pub const OFF: Self = Self::empty();

    const PRIORITIES: Self = Self::PRIORITY_HIGHEST
        .union(Self::PRIORITY_HIGH)
        .union(Self::PRIORITY_MEDIUM)
        .union(Self::PRIORITY_LOW)
        .union(Self::PRIORITY_LOWEST);

    /// Requested line priority, most urgent bit winning.
    pub fn priority(self) -> Option<Priority> {
        priority_from_ladder(self.intersection(Self::PRIORITIES).bits() >> 11)
    }
}

/// Map a five-rung priority ladder (bit 0 = highest) to NVIC levels 0..4.
pub(crate) fn priority_from_ladder(rungs: u32) -> Option<Priority> {
    if rungs == 0 {
        None
    } else {
        Some(rungs.trailing_zeros() as Priority)
    }
}
