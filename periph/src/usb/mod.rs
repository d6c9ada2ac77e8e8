//! USB resource composer.
//!
//! A [`UsbDevice`] owns up to three [`UsbInterface`] modules. Endpoint
//! numbers, interface numbers and descriptor sizes for the modules are
//! associated constants of the device type, so the layout is fixed when
//! the firmware is built and nothing is allocated at runtime:
//!
//! ```text
//! endpoint 0        control, owned by the device
//! endpoints 1..     module 0, then module 1, then module 2, back to back
//! ```
//!
//! Packet sizes follow the bus speed the controller reports, so a module's
//! bulk endpoints are 64 bytes at full speed and 512 at high speed. The
//! device also answers for the other speed through the device qualifier and
//! other-speed configuration descriptors.
//!
//! Only descriptor sizing, layout and endpoint bookkeeping live here; the
//! enumeration state machine belongs to the controller driver.

mod bulk;
mod cdc;
mod descriptor;
mod device;
mod interface;

pub use bulk::VendorBulk;
pub use cdc::CdcAcm;
pub use crate::hal::usb::UsbSpeed;
pub use descriptor::{
    Bcd16, ConfigAttributes, DescriptorError, DescriptorWriter, DeviceDescriptor,
    DeviceQualifier,
};
pub use device::UsbDevice;
pub use interface::{NullInterface, UsbInterface};

/// Descriptor type codes.
pub mod descriptor_type {
    pub const DEVICE: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
    pub const DEVICE_QUALIFIER: u8 = 0x06;
    pub const OTHER_SPEED_CONFIGURATION: u8 = 0x07;
    pub const INTERFACE_ASSOCIATION: u8 = 0x0B;
    pub const CS_INTERFACE: u8 = 0x24;
}

/// String descriptor indices reported in the device descriptor.
pub mod string_id {
    /// Index 0 lists the supported language ids instead of a string.
    pub const LANGUAGES: u8 = 0;
    pub const MANUFACTURER: u8 = 1;
    pub const PRODUCT: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
}

/// Direction of an endpoint, from the host's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointDirection {
    /// Host to device.
    Out = 0x00,
    /// Device to host.
    In = 0x80,
}

impl EndpointDirection {
    /// Endpoint address byte for endpoint `number`.
    pub const fn address(self, number: u8) -> u8 {
        number | self as u8
    }
}

/// Transfer type, encoded as in `bmAttributes`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointType {
    Control = 0b00,
    Isochronous = 0b01,
    Bulk = 0b10,
    Interrupt = 0b11,
}

/// Everything the controller needs to set up one endpoint buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub number: u8,
    pub direction: EndpointDirection,
    pub kind: EndpointType,
    pub max_packet_size: u16,
    /// Polling interval in frames; ignored for bulk and control.
    pub interval: u8,
}

impl EndpointConfig {
    pub const fn address(&self) -> u8 {
        self.direction.address(self.number)
    }
}

/// Per-device identity and power settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsbSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: Bcd16,
    pub attributes: ConfigAttributes,
    /// Maximum bus current in milliamps.
    pub power_ma: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub serial_number: &'static str,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            vendor_id: 0x1d50,
            product_id: 0x606d,
            version: Bcd16::new(0, 10),
            attributes: ConfigAttributes::SELF_POWERED,
            power_ma: 500,
            manufacturer: "Synthetos",
            product: "TinyG v2",
            serial_number: "0",
        }
    }
}
