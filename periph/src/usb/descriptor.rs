//! Standard descriptor layouts and a bounds-checked writer for them.

use bitflags::bitflags;
use core::fmt;

use super::descriptor_type;
use super::{EndpointConfig, string_id};

/// Binary-coded decimal version, as used for `bcdUSB` and `bcdDevice`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bcd16(pub u16);

impl Bcd16 {
    pub const USB_1_1: Self = Self::new(1, 10);
    pub const USB_2_0: Self = Self::new(2, 0);

    /// `major.minor`, where `minor` is in hundredths: `new(1, 10)` is 1.10.
    pub const fn new(major: u8, minor: u8) -> Self {
        let major = major % 100;
        let minor = minor % 100;
        Self(
            ((major / 10) as u16) << 12
                | ((major % 10) as u16) << 8
                | ((minor / 10) as u16) << 4
                | (minor % 10) as u16,
        )
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Bcd16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}.{:02x}", self.0 >> 8, self.0 & 0xFF)
    }
}

bitflags! {
    /// `bmAttributes` of the configuration descriptor.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ConfigAttributes: u8 {
        const SELF_POWERED = 0x40;
        const REMOTE_WAKEUP = 0x20;
    }
}

impl ConfigAttributes {
    /// Reserved bit 7 must always be set on the wire.
    const RESERVED: u8 = 0x80;

    pub const fn to_byte(self) -> u8 {
        self.bits() | Self::RESERVED
    }
}

/// Errors while laying out descriptors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// The output buffer ran out.
    BufferFull,
    /// A module wrote a different number of bytes than it declared.
    SizeMismatch { declared: u16, written: usize },
    /// The host asked for a string index the device does not have.
    UnknownString(u8),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::BufferFull => f.write_str("descriptor buffer full"),
            DescriptorError::SizeMismatch { declared, written } => write!(
                f,
                "descriptor size mismatch: declared {} bytes, wrote {}",
                declared, written
            ),
            DescriptorError::UnknownString(index) => write!(f, "no string descriptor {}", index),
        }
    }
}

/// Standard 18-byte device descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub usb_version: Bcd16,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_version: Bcd16,
    pub configurations: u8,
}

impl DeviceDescriptor {
    pub const LENGTH: usize = 18;

    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let usb = self.usb_version.to_le_bytes();
        let vendor = self.vendor_id.to_le_bytes();
        let product = self.product_id.to_le_bytes();
        let device = self.device_version.to_le_bytes();

        [
            Self::LENGTH as u8,
            descriptor_type::DEVICE,
            usb[0],
            usb[1],
            self.class,
            self.subclass,
            self.protocol,
            self.max_packet_size0,
            vendor[0],
            vendor[1],
            product[0],
            product[1],
            device[0],
            device[1],
            string_id::MANUFACTURER,
            string_id::PRODUCT,
            string_id::SERIAL_NUMBER,
            self.configurations,
        ]
    }
}

/// Device qualifier: what the device descriptor would say at the other
/// speed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceQualifier {
    pub usb_version: Bcd16,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub max_packet_size0: u8,
    pub configurations: u8,
}

impl DeviceQualifier {
    pub const LENGTH: usize = 10;

    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let usb = self.usb_version.to_le_bytes();
        [
            Self::LENGTH as u8,
            descriptor_type::DEVICE_QUALIFIER,
            usb[0],
            usb[1],
            self.class,
            self.subclass,
            self.protocol,
            self.max_packet_size0,
            self.configurations,
            0, // bReserved
        ]
    }
}

/// US English, the only language the device reports.
pub const LANGUAGE_EN_US: u16 = 0x0409;

/// UTF-16 code units that fit in one string descriptor.
pub const MAX_STRING_UNITS: usize = (u8::MAX as usize - 2) / 2;

/// Largest string descriptor, header included.
pub const MAX_STRING_LENGTH: usize = 2 + 2 * MAX_STRING_UNITS;

pub(crate) const CONFIG_HEADER_LENGTH: u16 = 9;
pub(crate) const INTERFACE_LENGTH: u16 = 9;
pub(crate) const ENDPOINT_LENGTH: u16 = 7;
pub(crate) const IAD_LENGTH: u16 = 8;

/// Sequential descriptor writer over a caller-provided buffer.
///
/// Every descriptor is emitted as `[bLength, bDescriptorType, body...]`.
pub struct DescriptorWriter<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.position]
    }

    /// Write one raw descriptor.
    pub fn write(&mut self, descriptor_type: u8, body: &[u8]) -> Result<(), DescriptorError> {
        let length = body.len() + 2;
        if length > u8::MAX as usize || self.position + length > self.buf.len() {
            return Err(DescriptorError::BufferFull);
        }

        let out = &mut self.buf[self.position..self.position + length];
        out[0] = length as u8;
        out[1] = descriptor_type;
        out[2..].copy_from_slice(body);
        self.position += length;
        Ok(())
    }

    /// Configuration header; `descriptor_type` is CONFIGURATION or
    /// OTHER_SPEED_CONFIGURATION, which share a layout.
    pub(crate) fn configuration(
        &mut self,
        descriptor_type: u8,
        total_length: u16,
        interfaces: u8,
        attributes: ConfigAttributes,
        power_ma: u16,
    ) -> Result<(), DescriptorError> {
        let total = total_length.to_le_bytes();
        self.write(
            descriptor_type,
            &[
                total[0],
                total[1],
                interfaces,
                1, // bConfigurationValue
                0, // iConfiguration
                attributes.to_byte(),
                (power_ma / 2).min(u8::MAX as u16) as u8,
            ],
        )
    }

    /// Interface Association Descriptor grouping `count` interfaces.
    pub fn interface_association(
        &mut self,
        first_interface: u8,
        count: u8,
        class: u8,
        subclass: u8,
        protocol: u8,
    ) -> Result<(), DescriptorError> {
        self.write(
            descriptor_type::INTERFACE_ASSOCIATION,
            &[first_interface, count, class, subclass, protocol, 0],
        )
    }

    pub fn interface(
        &mut self,
        number: u8,
        endpoints: u8,
        class: u8,
        subclass: u8,
        protocol: u8,
    ) -> Result<(), DescriptorError> {
        self.write(
            descriptor_type::INTERFACE,
            &[number, 0, endpoints, class, subclass, protocol, 0],
        )
    }

    /// String descriptor holding `text` as UTF-16LE, cut to
    /// [`MAX_STRING_UNITS`] code units.
    pub fn string(&mut self, text: &str) -> Result<(), DescriptorError> {
        let units = text.encode_utf16().count().min(MAX_STRING_UNITS);
        let length = 2 + 2 * units;
        if self.position + length > self.buf.len() {
            return Err(DescriptorError::BufferFull);
        }

        let out = &mut self.buf[self.position..self.position + length];
        out[0] = length as u8;
        out[1] = descriptor_type::STRING;
        for (pair, unit) in out[2..].chunks_exact_mut(2).zip(text.encode_utf16()) {
            pair.copy_from_slice(&unit.to_le_bytes());
        }
        self.position += length;
        Ok(())
    }

    /// String descriptor 0: the supported language ids.
    pub fn languages(&mut self, languages: &[u16]) -> Result<(), DescriptorError> {
        let mut body = [0u8; MAX_STRING_LENGTH - 2];
        let count = languages.len().min(MAX_STRING_UNITS);
        for (pair, language) in body.chunks_exact_mut(2).zip(&languages[..count]) {
            pair.copy_from_slice(&language.to_le_bytes());
        }
        self.write(descriptor_type::STRING, &body[..2 * count])
    }

    pub fn endpoint(&mut self, endpoint: &EndpointConfig) -> Result<(), DescriptorError> {
        let size = endpoint.max_packet_size.to_le_bytes();
        self.write(
            descriptor_type::ENDPOINT,
            &[
                endpoint.address(),
                endpoint.kind as u8,
                size[0],
                size[1],
                endpoint.interval,
            ],
        )
    }
}
