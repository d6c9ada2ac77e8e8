//! USB device controller abstraction.
//!
//! Enumeration itself is outside this crate; the composer only needs to
//! know how many endpoints the controller has, what speed the bus came up
//! at and how to push descriptor bytes out of the control endpoint.

/// Bus speed negotiated at reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UsbSpeed {
    Low,
    Full,
    High,
}

impl UsbSpeed {
    /// The speed a high-speed capable device would run at on the other
    /// kind of port. Low speed has no counterpart.
    pub const fn other(self) -> Self {
        match self {
            UsbSpeed::High => UsbSpeed::Full,
            UsbSpeed::Full => UsbSpeed::High,
            UsbSpeed::Low => UsbSpeed::Low,
        }
    }

    /// Largest bulk packet allowed at this speed.
    pub const fn bulk_packet_size(self) -> u16 {
        match self {
            UsbSpeed::High => 512,
            UsbSpeed::Full | UsbSpeed::Low => 64,
        }
    }
}

pub trait UsbHardware {
    /// Endpoints the controller implements, including endpoint 0.
    const ENDPOINT_COUNT: u8;

    /// Maximum packet size of endpoint 0 at full and high speed.
    const CONTROL_ENDPOINT_SIZE: u8;

    /// Current bus speed.
    fn speed(&self) -> UsbSpeed;

    /// Queue `data` on the control IN endpoint, returning bytes written.
    fn write_control(&mut self, data: &[u8]) -> usize;
}
