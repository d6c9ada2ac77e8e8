//! Microchip SAM S70 (Cortex-M7) platform.
//!
//! Owns the per-source interrupt registries and the vector bodies that
//! drain them. Drivers register against the statics below during start-up:
//!
//! ```no_run
//! use periph::irq::Registry;
//! use periph::platform::sams70::{PORT_INTERRUPTS, pio::Port};
//!
//! fn on_button(_pins: u32) {}
//!
//! PORT_INTERRUPTS[Port::C.index()].register(1 << 9, on_button).ok();
//! ```

pub mod afec;
pub mod nvic;
pub mod pio;
pub mod uart;
pub mod usbhs;
pub mod vectors;
pub mod xdmac;

use core::ptr::write_volatile;

use log::debug;

use super::Platform;
use crate::hal::interrupt::{IrqNumber, Priority};
use crate::irq::{InterruptChain, SlotTable};

/// Peripheral interrupt lines (also the PMC peripheral ids).
pub mod irq {
    use crate::hal::interrupt::IrqNumber;

    pub const UART0: IrqNumber = 7;
    pub const UART1: IrqNumber = 8;
    pub const PIOA: IrqNumber = 10;
    pub const PIOB: IrqNumber = 11;
    pub const PIOC: IrqNumber = 12;
    pub const USART0: IrqNumber = 13;
    pub const USART1: IrqNumber = 14;
    pub const USART2: IrqNumber = 15;
    pub const PIOD: IrqNumber = 16;
    pub const PIOE: IrqNumber = 17;
    pub const SPI0: IrqNumber = 21;
    pub const AFEC0: IrqNumber = 29;
    pub const USBHS: IrqNumber = 34;
    pub const AFEC1: IrqNumber = 40;
    pub const SPI1: IrqNumber = 42;
    pub const UART2: IrqNumber = 44;
    pub const UART3: IrqNumber = 45;
    pub const UART4: IrqNumber = 46;
    pub const XDMAC: IrqNumber = 58;
}

// ============================================================================
// Interrupt Registries
// ============================================================================

/// Handlers per PIO port, indexed by [`Port::index`](pio::Port::index).
/// Status bits are pin numbers.
pub static PORT_INTERRUPTS: [InterruptChain<8>; 5] = [const { InterruptChain::new() }; 5];

/// End-of-conversion handlers per AFEC unit, one slot per channel.
pub static AFEC_INTERRUPTS: [SlotTable<{ afec::CHANNELS }>; 2] =
    [const { SlotTable::new() }; 2];

/// Handlers per UART unit. Status bits are the UART SR bits.
pub static UART_INTERRUPTS: [InterruptChain<4>; 5] = [const { InterruptChain::new() }; 5];

/// Completion handlers for XDMAC. Status bits are channel numbers.
pub static XDMAC_INTERRUPTS: InterruptChain<{ xdmac::CHANNEL_COUNT as usize }> =
    InterruptChain::new();

// ============================================================================
// Power Management Controller
// ============================================================================

const PMC_BASE: usize = 0x400E_0600;
const PMC_PCER0: usize = 0x10;
const PMC_PCER1: usize = 0x100;

/// Turn on the peripheral clock for `id`.
pub fn enable_peripheral_clock(id: u32) {
    let (offset, bit) = if id < 32 {
        (PMC_PCER0, id)
    } else {
        (PMC_PCER1, id - 32)
    };
    unsafe { write_volatile((PMC_BASE + offset) as *mut u32, 1 << bit) };
}

// ============================================================================
// Platform Implementation
// ============================================================================

pub struct Sams70Platform;

impl Platform for Sams70Platform {
    fn name() -> &'static str {
        "Microchip SAM S70"
    }

    unsafe fn early_init() {
        for port in pio::Port::ALL {
            enable_peripheral_clock(port.irq());
        }
        for line in [irq::AFEC0, irq::AFEC1] {
            enable_peripheral_clock(line);
        }
        for line in [irq::UART0, irq::UART1, irq::UART2, irq::UART3, irq::UART4] {
            enable_peripheral_clock(line);
        }
        debug!("{}: peripheral clocks enabled", Self::name());
    }

    fn enable_irq(irq: IrqNumber) {
        nvic::enable_irq(irq);
    }

    fn disable_irq(irq: IrqNumber) {
        nvic::disable_irq(irq);
    }

    fn set_irq_priority(irq: IrqNumber, priority: Priority) {
        nvic::set_priority(irq, priority);
    }
}
