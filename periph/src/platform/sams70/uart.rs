//! UART interrupt source.
//!
//! Only what the interrupt path needs: status, byte access and the
//! interrupt mask. Baud rate and pin muxing belong to the board code.

use core::ptr::{read_volatile, write_volatile};

use super::{irq, nvic};
use crate::hal::interrupt::{InterruptFlags, InterruptSource, IrqNumber, SourceId};

// Register offsets
const UART_CR: usize = 0x00;
const UART_IER: usize = 0x08;
const UART_IDR: usize = 0x0C;
const UART_IMR: usize = 0x10;
const UART_SR: usize = 0x14;
const UART_RHR: usize = 0x18;
const UART_THR: usize = 0x1C;

const CR_RSTSTA: u32 = 1 << 8;

// Status / interrupt bits
pub const RXRDY: u32 = 1 << 0;
pub const TXRDY: u32 = 1 << 1;
pub const OVRE: u32 = 1 << 5;
pub const FRAME: u32 = 1 << 6;
pub const PARE: u32 = 1 << 7;
pub const TXEMPTY: u32 = 1 << 9;

const ERRORS: u32 = OVRE | FRAME | PARE;

const UART_BASES: [usize; 5] = [
    0x400E_0800,
    0x400E_0A00,
    0x400E_1A00,
    0x400E_1C00,
    0x400E_1E00,
];

const UART_IRQS: [IrqNumber; 5] = [irq::UART0, irq::UART1, irq::UART2, irq::UART3, irq::UART4];

pub struct Uart {
    unit: u8,
    base: usize,
}

impl Uart {
    /// # Safety
    ///
    /// `unit` must be below 5, and the caller must own that unit.
    pub const unsafe fn new(unit: u8) -> Self {
        Self {
            unit,
            base: UART_BASES[unit as usize],
        }
    }

    pub const fn irq(&self) -> IrqNumber {
        UART_IRQS[self.unit as usize]
    }

    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }

    pub fn read_byte(&mut self) -> u8 {
        self.read_reg(UART_RHR) as u8
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.write_reg(UART_THR, byte as u32);
    }

    /// Translate the generic option word into UART interrupt bits.
    pub fn set_interrupts(&mut self, flags: InterruptFlags) {
        let irq = self.irq();
        if flags == InterruptFlags::OFF {
            self.write_reg(UART_IDR, u32::MAX);
            nvic::disable_irq(irq);
            return;
        }

        let mut bits = 0;
        if flags.contains(InterruptFlags::RX_READY) {
            bits |= RXRDY;
        }
        if flags.contains(InterruptFlags::TX_READY) {
            bits |= TXRDY;
        }
        if flags.contains(InterruptFlags::TX_DONE) {
            bits |= TXEMPTY;
        }
        if flags.intersects(InterruptFlags::RX_ERROR | InterruptFlags::TX_ERROR) {
            bits |= ERRORS;
        }

        if let Some(priority) = flags.priority() {
            nvic::set_priority(irq, priority);
        }
        self.write_reg(UART_IDR, !bits);
        self.write_reg(UART_IER, bits);
        nvic::enable_irq(irq);
    }
}

impl InterruptSource for Uart {
    fn source(&self) -> SourceId {
        SourceId::Uart(self.unit)
    }

    fn status(&mut self) -> u32 {
        self.read_reg(UART_SR) & self.read_reg(UART_IMR)
    }

    /// Ready bits clear by servicing the FIFO; only error flags need a reset.
    fn clear(&mut self, bits: u32) {
        if bits & ERRORS != 0 {
            self.write_reg(UART_CR, CR_RSTSTA);
        }
    }

    fn acknowledge(&mut self) {
        nvic::clear_pending(self.irq());
    }
}
