//! USB high-speed device port: bus speed and control endpoint output.

use core::ptr::{read_volatile, write_volatile};

use crate::hal::usb::{UsbHardware, UsbSpeed};

const USBHS_BASE: usize = 0x4003_8000;
const USBHS_DEVEPTISR0: usize = 0x130;
const USBHS_DEVEPTICR0: usize = 0x160;
const USBHS_SR: usize = 0x804;

const SR_SPEED_SHIFT: u32 = 12;
const SR_SPEED_MASK: u32 = 0b11 << SR_SPEED_SHIFT;

/// Endpoint 0 FIFO in the dual-port RAM.
const EP0_FIFO: usize = 0xA010_0000;

const TXINI: u32 = 1 << 0;

const CONTROL_PACKET: usize = 64;

pub struct Usbhs;

impl Usbhs {
    /// # Safety
    ///
    /// The caller must own the USBHS device port.
    pub const unsafe fn new() -> Self {
        Self
    }

    #[inline]
    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { read_volatile((USBHS_BASE + offset) as *const u32) }
    }

    #[inline]
    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { write_volatile((USBHS_BASE + offset) as *mut u32, value) }
    }

    /// Wait for the IN bank, fill it and hand it to the controller.
    fn send_packet(&mut self, packet: &[u8]) {
        while self.read_reg(USBHS_DEVEPTISR0) & TXINI == 0 {
            core::hint::spin_loop();
        }

        let fifo = EP0_FIFO as *mut u8;
        for (i, byte) in packet.iter().enumerate() {
            unsafe { write_volatile(fifo.add(i), *byte) };
        }

        self.write_reg(USBHS_DEVEPTICR0, TXINI);
    }
}

/// Decode USBHS_SR.SPEED. The reserved encoding reads as low speed.
fn decode_speed(status: u32) -> UsbSpeed {
    match (status & SR_SPEED_MASK) >> SR_SPEED_SHIFT {
        0 => UsbSpeed::Full,
        1 => UsbSpeed::High,
        _ => UsbSpeed::Low,
    }
}

impl UsbHardware for Usbhs {
    const ENDPOINT_COUNT: u8 = 10;
    const CONTROL_ENDPOINT_SIZE: u8 = CONTROL_PACKET as u8;

    fn speed(&self) -> UsbSpeed {
        decode_speed(self.read_reg(USBHS_SR))
    }

    fn write_control(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            self.send_packet(&[]);
            return 0;
        }
        for packet in data.chunks(CONTROL_PACKET) {
            self.send_packet(packet);
        }
        data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_field() {
        assert_eq!(decode_speed(0), UsbSpeed::Full);
        assert_eq!(decode_speed(1 << 12), UsbSpeed::High);
        assert_eq!(decode_speed(2 << 12), UsbSpeed::Low);
        assert_eq!(decode_speed(3 << 12), UsbSpeed::Low);
        // VBUSRQ and friends sit outside the field.
        assert_eq!(decode_speed(0x0000_0C00 | 1 << 12), UsbSpeed::High);
    }
}
