//! Cortex-M7 Nested Vectored Interrupt Controller.
//!
//! Register access goes through `cortex_m::peripheral::NVIC`; this module
//! only maps the crate's raw line numbers onto [`Irq`] and the S70's three
//! implemented priority bits onto the NVIC's byte-wide fields.

use crate::hal::interrupt::{
    InterruptController, IrqNumber, Priority, PriorityInterruptController,
};
use core::fmt;
use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::scb::VectActive;
use cortex_m::peripheral::{NVIC, SCB};
use log::warn;

/// The S70 implements the top three priority bits.
const PRIORITY_BITS: u8 = 3;

/// Peripheral interrupt lines on the S70.
pub const IRQ_COUNT: IrqNumber = 74;

/// A peripheral interrupt line known to exist on the S70.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Irq(u16);

impl Irq {
    pub const fn new(irq: IrqNumber) -> Result<Self, NvicError> {
        if irq < IRQ_COUNT {
            Ok(Irq(irq as u16))
        } else {
            Err(NvicError::InvalidIrq(irq))
        }
    }

    pub const fn line(self) -> IrqNumber {
        self.0 as IrqNumber
    }
}

// SAFETY: `Irq::new` only admits lines below `IRQ_COUNT`.
unsafe impl InterruptNumber for Irq {
    #[inline]
    fn number(self) -> u16 {
        self.0
    }
}

/// Priority level to the NVIC's byte encoding (top bits only).
const fn encode_priority(priority: Priority) -> u8 {
    priority << (8 - PRIORITY_BITS)
}

const fn decode_priority(raw: u8) -> Priority {
    raw >> (8 - PRIORITY_BITS)
}

// ============================================================================
// Line Helpers
// ============================================================================

fn valid(irq: IrqNumber) -> Option<Irq> {
    match Irq::new(irq) {
        Ok(line) => Some(line),
        Err(err) => {
            warn!("NVIC: {}", err);
            None
        }
    }
}

pub fn enable_irq(irq: IrqNumber) {
    if let Some(line) = valid(irq) {
        // SAFETY: every handler reachable from this line is a registry
        // dispatch that takes no locks.
        unsafe { NVIC::unmask(line) };
    }
}

pub fn disable_irq(irq: IrqNumber) {
    if let Some(line) = valid(irq) {
        NVIC::mask(line);
    }
}

pub fn is_enabled(irq: IrqNumber) -> bool {
    valid(irq).is_some_and(NVIC::is_enabled)
}

pub fn is_pending(irq: IrqNumber) -> bool {
    valid(irq).is_some_and(NVIC::is_pending)
}

pub fn set_pending(irq: IrqNumber) {
    if let Some(line) = valid(irq) {
        NVIC::pend(line);
    }
}

pub fn clear_pending(irq: IrqNumber) {
    if let Some(line) = valid(irq) {
        NVIC::unpend(line);
    }
}

pub fn set_priority(irq: IrqNumber, priority: Priority) {
    if let Some(line) = valid(irq) {
        // SAFETY: IPR bytes are per line; writing one leaves the others
        // alone, so the stolen handle never aliases another line's state.
        unsafe {
            let mut nvic = cortex_m::Peripherals::steal().NVIC;
            nvic.set_priority(line, encode_priority(priority));
        }
    }
}

pub fn priority(irq: IrqNumber) -> Priority {
    valid(irq).map_or(0, |line| decode_priority(NVIC::get_priority(line)))
}

/// Peripheral line currently being serviced, if the core is in one.
pub fn active_irq() -> Option<IrqNumber> {
    match SCB::vect_active() {
        VectActive::Interrupt { irqn } => Some(IrqNumber::from(irqn)),
        VectActive::ThreadMode | VectActive::Exception(_) => None,
    }
}

// ============================================================================
// HAL Implementation
// ============================================================================

/// NVIC errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NvicError {
    /// No such peripheral interrupt line.
    InvalidIrq(IrqNumber),
}

impl fmt::Display for NvicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NvicError::InvalidIrq(irq) => write!(f, "no interrupt line {}", irq),
        }
    }
}

#[derive(Debug)]
pub struct Nvic;

impl Nvic {
    /// # Safety
    ///
    /// Only one owner should reconfigure the NVIC at a time.
    pub const unsafe fn new() -> Self {
        Self
    }
}

impl InterruptController for Nvic {
    type Error = NvicError;

    fn enable(&mut self, irq: IrqNumber) -> Result<(), Self::Error> {
        let line = Irq::new(irq)?;
        unsafe { NVIC::unmask(line) };
        Ok(())
    }

    fn disable(&mut self, irq: IrqNumber) -> Result<(), Self::Error> {
        NVIC::mask(Irq::new(irq)?);
        Ok(())
    }

    fn is_pending(&self, irq: IrqNumber) -> Result<bool, Self::Error> {
        Ok(NVIC::is_pending(Irq::new(irq)?))
    }

    fn clear_pending(&mut self, irq: IrqNumber) -> Result<(), Self::Error> {
        NVIC::unpend(Irq::new(irq)?);
        Ok(())
    }
}

impl PriorityInterruptController for Nvic {
    fn set_priority(&mut self, irq: IrqNumber, priority: Priority) -> Result<(), Self::Error> {
        Irq::new(irq)?;
        set_priority(irq, priority);
        Ok(())
    }

    fn get_priority(&self, irq: IrqNumber) -> Result<Priority, Self::Error> {
        Ok(decode_priority(NVIC::get_priority(Irq::new(irq)?)))
    }
}
