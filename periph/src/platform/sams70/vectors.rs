//! Interrupt vector bodies.
//!
//! The startup code's vector table refers to these by name. Each one hands
//! its source to the matching registry; anything else lands in
//! `Dummy_Handler`.

#![allow(non_snake_case)]

use super::afec::Afec;
use super::pio::{PioPort, Port};
use super::uart::Uart;
use super::xdmac::XdmacSource;
use super::{AFEC_INTERRUPTS, PORT_INTERRUPTS, UART_INTERRUPTS, XDMAC_INTERRUPTS, nvic};
use crate::hal::interrupt::{InterruptSource, SourceId};
use crate::irq::{Registry, unhandled_interrupt};

fn port(port: Port) {
    let mut pio = unsafe { PioPort::new(port) };
    PORT_INTERRUPTS[port.index()].dispatch(&mut pio);
}

fn adc<const UNIT: u8>() {
    let mut afec = unsafe { Afec::<UNIT>::new() };
    AFEC_INTERRUPTS[UNIT as usize].dispatch(&mut afec);
}

fn uart(unit: u8) {
    let mut uart = unsafe { Uart::new(unit) };
    UART_INTERRUPTS[unit as usize].dispatch(&mut uart);
}

#[unsafe(no_mangle)]
pub extern "C" fn PIOA_Handler() {
    port(Port::A);
}

#[unsafe(no_mangle)]
pub extern "C" fn PIOB_Handler() {
    port(Port::B);
}

#[unsafe(no_mangle)]
pub extern "C" fn PIOC_Handler() {
    port(Port::C);
}

#[unsafe(no_mangle)]
pub extern "C" fn PIOD_Handler() {
    port(Port::D);
}

#[unsafe(no_mangle)]
pub extern "C" fn PIOE_Handler() {
    port(Port::E);
}

#[unsafe(no_mangle)]
pub extern "C" fn AFEC0_Handler() {
    adc::<0>();
}

#[unsafe(no_mangle)]
pub extern "C" fn AFEC1_Handler() {
    adc::<1>();
}

#[unsafe(no_mangle)]
pub extern "C" fn UART0_Handler() {
    uart(0);
}

#[unsafe(no_mangle)]
pub extern "C" fn UART1_Handler() {
    uart(1);
}

#[unsafe(no_mangle)]
pub extern "C" fn UART2_Handler() {
    uart(2);
}

#[unsafe(no_mangle)]
pub extern "C" fn UART3_Handler() {
    uart(3);
}

#[unsafe(no_mangle)]
pub extern "C" fn UART4_Handler() {
    uart(4);
}

#[unsafe(no_mangle)]
pub extern "C" fn XDMAC_Handler() {
    XDMAC_INTERRUPTS.dispatch(&mut XdmacSource);
}

/// A line that is enabled at the NVIC but has no registry.
struct StrayLine(u32);

impl InterruptSource for StrayLine {
    fn source(&self) -> SourceId {
        SourceId::Line(self.0)
    }

    fn status(&mut self) -> u32 {
        0
    }

    fn clear(&mut self, _bits: u32) {}

    fn acknowledge(&mut self) {
        nvic::clear_pending(self.0);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn Dummy_Handler() {
    // Core exceptions have no registry to report to.
    if let Some(line) = nvic::active_irq() {
        unhandled_interrupt(&mut StrayLine(line));
    }
}
