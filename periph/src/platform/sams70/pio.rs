//! Parallel I/O controller: pin change interrupts.

use core::ptr::{read_volatile, write_volatile};

use super::{irq, nvic};
use crate::hal::gpio::{EdgeDetect, GpioError, GpioInterrupts, LevelDetect};
use crate::hal::interrupt::{InterruptSource, IrqNumber, Priority, SourceId};

// Register offsets
const PIO_IER: usize = 0x40;
const PIO_IDR: usize = 0x44;
const PIO_IMR: usize = 0x48;
const PIO_ISR: usize = 0x4C;
const PIO_AIMER: usize = 0xB0;
const PIO_AIMDR: usize = 0xB4;
const PIO_ESR: usize = 0xC0;
const PIO_LSR: usize = 0xC4;
const PIO_FELLSR: usize = 0xD0;
const PIO_REHLSR: usize = 0xD4;

/// The five PIO controllers of the S70.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
}

impl Port {
    pub const ALL: [Port; 5] = [Port::A, Port::B, Port::C, Port::D, Port::E];

    pub const fn base(self) -> usize {
        match self {
            Port::A => 0x400E_0E00,
            Port::B => 0x400E_1000,
            Port::C => 0x400E_1200,
            Port::D => 0x400E_1400,
            Port::E => 0x400E_1600,
        }
    }

    pub const fn irq(self) -> IrqNumber {
        match self {
            Port::A => irq::PIOA,
            Port::B => irq::PIOB,
            Port::C => irq::PIOC,
            Port::D => irq::PIOD,
            Port::E => irq::PIOE,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
        }
    }

    /// Position in the per-port registry table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

pub struct PioPort {
    port: Port,
}

impl PioPort {
    /// # Safety
    ///
    /// The caller must not create two handles that reconfigure the same pins
    /// concurrently.
    pub const unsafe fn new(port: Port) -> Self {
        Self { port }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.port.base() + offset) as *const u32) }
    }

    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { write_volatile((self.port.base() + offset) as *mut u32, value) }
    }

    /// Pins whose interrupt is currently unmasked.
    pub fn enabled_pins(&self) -> u32 {
        self.read_reg(PIO_IMR)
    }

    fn unmask(&mut self, mask: u32) {
        nvic::enable_irq(self.port.irq());
        self.write_reg(PIO_IER, mask);
    }
}

impl InterruptSource for PioPort {
    fn source(&self) -> SourceId {
        SourceId::Port(self.port.letter())
    }

    /// PIO_ISR is read-to-clear: the read here drops every latched edge,
    /// so change bits on pins without a registered handler are lost.
    fn status(&mut self) -> u32 {
        self.read_reg(PIO_ISR) & self.read_reg(PIO_IMR)
    }

    fn clear(&mut self, _bits: u32) {}

    fn acknowledge(&mut self) {
        nvic::clear_pending(self.port.irq());
    }
}

impl GpioInterrupts for PioPort {
    type Error = GpioError;

    fn enable_edge_detect(&mut self, mask: u32, edge: EdgeDetect) -> Result<(), GpioError> {
        match edge {
            EdgeDetect::Both => self.write_reg(PIO_AIMDR, mask),
            EdgeDetect::Rising => {
                self.write_reg(PIO_AIMER, mask);
                self.write_reg(PIO_ESR, mask);
                self.write_reg(PIO_REHLSR, mask);
            }
            EdgeDetect::Falling => {
                self.write_reg(PIO_AIMER, mask);
                self.write_reg(PIO_ESR, mask);
                self.write_reg(PIO_FELLSR, mask);
            }
        }
        self.unmask(mask);
        Ok(())
    }

    fn enable_level_detect(&mut self, mask: u32, level: LevelDetect) -> Result<(), GpioError> {
        self.write_reg(PIO_AIMER, mask);
        self.write_reg(PIO_LSR, mask);
        match level {
            LevelDetect::High => self.write_reg(PIO_REHLSR, mask),
            LevelDetect::Low => self.write_reg(PIO_FELLSR, mask),
        }
        self.unmask(mask);
        Ok(())
    }

    fn disable_interrupts(&mut self, mask: u32) -> Result<(), GpioError> {
        self.write_reg(PIO_IDR, mask);
        if self.read_reg(PIO_IMR) == 0 {
            nvic::disable_irq(self.port.irq());
        }
        Ok(())
    }

    fn set_line_priority(&mut self, priority: Priority) -> Result<(), GpioError> {
        nvic::set_priority(self.port.irq(), priority);
        Ok(())
    }
}
