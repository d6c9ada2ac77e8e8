//! Analog front-end controller (AFEC) end-of-conversion interrupts.
//!
//! Each channel has its own EOC bit in ISR, so the registry for an AFEC
//! unit is a [`SlotTable`](crate::irq::SlotTable) indexed by channel.
//!
//! The unit is a type parameter, so naming one the chip lacks fails the build:
//!
//! ```compile_fail
//! use periph::platform::sams70::afec::Afec;
//!
//! let mut adc = unsafe { Afec::<2>::new() };
//! adc.enable_channel(0);
//! ```

use core::ptr::{read_volatile, write_volatile};

use super::{irq, nvic};
use crate::hal::interrupt::{InterruptSource, IrqNumber, Priority, SourceId};

const AFEC_CHER: usize = 0x14;
const AFEC_CHDR: usize = 0x18;
const AFEC_IER: usize = 0x24;
const AFEC_IDR: usize = 0x28;
const AFEC_IMR: usize = 0x2C;
const AFEC_ISR: usize = 0x30;
const AFEC_CSELR: usize = 0x64;
const AFEC_CDR: usize = 0x68;

/// Conversion channels per unit.
pub const CHANNELS: usize = 12;

const EOC_MASK: u32 = (1 << CHANNELS) - 1;

/// One AFEC unit; `UNIT` is 0 or 1.
pub struct Afec<const UNIT: u8> {
    base: usize,
}

impl<const UNIT: u8> Afec<UNIT> {
    const BASE: usize = match UNIT {
        0 => 0x4003_C000,
        1 => 0x4006_4000,
        _ => panic!("the S70 has AFEC0 and AFEC1 only"),
    };

    const IRQ: IrqNumber = match UNIT {
        0 => irq::AFEC0,
        _ => irq::AFEC1,
    };

    /// # Safety
    ///
    /// The caller must own this unit.
    pub const unsafe fn new() -> Self {
        Self { base: Self::BASE }
    }

    #[cfg(test)]
    fn at(registers: &mut [u32]) -> Self {
        assert!(registers.len() * 4 > AFEC_CDR);
        Self {
            base: registers.as_mut_ptr() as usize,
        }
    }

    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }

    pub fn enable_channel(&mut self, channel: u8) {
        self.write_reg(AFEC_CHER, 1 << channel);
    }

    pub fn disable_channel(&mut self, channel: u8) {
        self.write_reg(AFEC_CHDR, 1 << channel);
    }

    /// Unmask the end-of-conversion interrupt of `channel`.
    pub fn enable_interrupt(&mut self, channel: u8, priority: Option<Priority>) {
        if let Some(priority) = priority {
            nvic::set_priority(Self::IRQ, priority);
        }
        nvic::enable_irq(Self::IRQ);
        self.write_reg(AFEC_IER, 1 << channel);
    }

    pub fn disable_interrupt(&mut self, channel: u8) {
        self.write_reg(AFEC_IDR, 1 << channel);
        if self.read_reg(AFEC_IMR) & EOC_MASK == 0 {
            nvic::disable_irq(Self::IRQ);
        }
    }

    /// Last converted value of `channel`.
    ///
    /// The handler also moves CSELR, so EOC interrupts are masked in the
    /// unit for the select/read pair and restored afterwards.
    pub fn read(&mut self, channel: u8) -> u16 {
        let enabled = self.read_reg(AFEC_IMR) & EOC_MASK;
        if enabled != 0 {
            self.write_reg(AFEC_IDR, enabled);
        }
        let value = self.select_and_read(channel);
        if enabled != 0 {
            self.write_reg(AFEC_IER, enabled);
        }
        value
    }

    fn select_and_read(&self, channel: u8) -> u16 {
        self.write_reg(AFEC_CSELR, channel as u32);
        (self.read_reg(AFEC_CDR) & 0xFFFF) as u16
    }
}

impl<const UNIT: u8> InterruptSource for Afec<UNIT> {
    fn source(&self) -> SourceId {
        SourceId::Adc(UNIT)
    }

    fn status(&mut self) -> u32 {
        self.read_reg(AFEC_ISR) & self.read_reg(AFEC_IMR) & EOC_MASK
    }

    /// EOC bits only clear when the channel's data register is read.
    /// Runs in the handler, so it selects without masking.
    fn clear(&mut self, bits: u32) {
        let mut pending = bits & EOC_MASK;
        while pending != 0 {
            let channel = pending.trailing_zeros() as u8;
            let _ = self.select_and_read(channel);
            pending &= pending - 1;
        }
    }

    fn acknowledge(&mut self) {
        nvic::clear_pending(Self::IRQ);
    }
}
