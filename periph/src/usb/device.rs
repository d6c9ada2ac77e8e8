use core::ops::Range;

use log::debug;

use super::descriptor::{
    Bcd16, CONFIG_HEADER_LENGTH, DescriptorError, DescriptorWriter, DeviceDescriptor,
    DeviceQualifier, LANGUAGE_EN_US, MAX_STRING_LENGTH,
};
use super::interface::{NullInterface, UsbInterface};
use super::{
    EndpointConfig, EndpointDirection, EndpointType, UsbSettings, descriptor_type, string_id,
};
use crate::hal::usb::{UsbHardware, UsbSpeed};

const IAD_CLASS: u8 = 0xEF;
const IAD_SUBCLASS: u8 = 0x02;
const IAD_PROTOCOL: u8 = 0x01;

/// Largest configuration descriptor the device will assemble.
pub const MAX_CONFIG_LENGTH: usize = 256;

/// Endpoint 0 packet size on a low-speed bus.
const LOW_SPEED_CONTROL_SIZE: u8 = 8;

/// A USB device built from up to three interface modules on hardware `H`.
///
/// Unused positions default to [`NullInterface`]. Endpoint 0 belongs to the
/// device; module `i` gets the endpoints right after those of module
/// `i - 1`, starting at 1.
///
/// # Example
///
/// ```
/// use periph::hal::usb::{UsbHardware, UsbSpeed};
/// use periph::usb::{CdcAcm, UsbDevice, UsbSettings, VendorBulk};
///
/// struct Sink;
/// impl UsbHardware for Sink {
///     const ENDPOINT_COUNT: u8 = 10;
///     const CONTROL_ENDPOINT_SIZE: u8 = 64;
///     fn speed(&self) -> UsbSpeed {
///         UsbSpeed::High
///     }
///     fn write_control(&mut self, data: &[u8]) -> usize {
///         data.len()
///     }
/// }
///
/// type Device = UsbDevice<Sink, CdcAcm, VendorBulk>;
///
/// assert_eq!(Device::FIRST_ENDPOINT, [1, 4, 6]);
/// assert_eq!(Device::TOTAL_ENDPOINTS_USED, 6);
///
/// let device = Device::new(Sink, UsbSettings::default());
/// assert_eq!(device.endpoint_count(), (1, 6));
/// assert_eq!(device.endpoint_config(5).map(|c| c.max_packet_size), Some(512));
/// ```
///
/// A composition that needs more endpoints than the controller has does
/// not build:
///
/// ```compile_fail
/// use periph::hal::usb::{UsbHardware, UsbSpeed};
/// use periph::usb::{CdcAcm, UsbDevice, UsbSettings};
///
/// struct Small;
/// impl UsbHardware for Small {
///     const ENDPOINT_COUNT: u8 = 6;
///     const CONTROL_ENDPOINT_SIZE: u8 = 64;
///     fn speed(&self) -> UsbSpeed {
///         UsbSpeed::Full
///     }
///     fn write_control(&mut self, data: &[u8]) -> usize {
///         data.len()
///     }
/// }
///
/// // Two serial ports need endpoints 0..=6.
/// let device = UsbDevice::<Small, CdcAcm, CdcAcm>::new(Small, UsbSettings::default());
/// ```
pub struct UsbDevice<H, I0, I1 = NullInterface, I2 = NullInterface>
where
    H: UsbHardware,
    I0: UsbInterface,
    I1: UsbInterface,
    I2: UsbInterface,
{
    hardware: H,
    settings: UsbSettings,
    interface_0: I0,
    interface_1: I1,
    interface_2: I2,
}

impl<H, I0, I1, I2> UsbDevice<H, I0, I1, I2>
where
    H: UsbHardware,
    I0: UsbInterface,
    I1: UsbInterface,
    I2: UsbInterface,
{
    /// First endpoint number of each module position.
    pub const FIRST_ENDPOINT: [u8; 3] = [
        1,
        1 + I0::ENDPOINTS_USED,
        1 + I0::ENDPOINTS_USED + I1::ENDPOINTS_USED,
    ];

    /// First interface number of each module position.
    pub const FIRST_INTERFACE: [u8; 3] = [
        0,
        I0::INTERFACES_USED,
        I0::INTERFACES_USED + I1::INTERFACES_USED,
    ];

    /// Endpoints in use, endpoint 0 included.
    pub const TOTAL_ENDPOINTS_USED: u8 =
        1 + I0::ENDPOINTS_USED + I1::ENDPOINTS_USED + I2::ENDPOINTS_USED;

    pub const TOTAL_INTERFACES_USED: u8 =
        I0::INTERFACES_USED + I1::INTERFACES_USED + I2::INTERFACES_USED;

    /// Bytes contributed by the modules to the configuration descriptor.
    pub const TOTAL_DESCRIPTOR_SIZE: u16 =
        I0::DESCRIPTOR_SIZE + I1::DESCRIPTOR_SIZE + I2::DESCRIPTOR_SIZE;

    /// `wTotalLength` of the configuration descriptor.
    pub const CONFIG_TOTAL_LENGTH: u16 = CONFIG_HEADER_LENGTH + Self::TOTAL_DESCRIPTOR_SIZE;

    /// Modules other than [`NullInterface`].
    pub const ACTIVE_INTERFACES: u8 =
        (!I0::IS_NULL) as u8 + (!I1::IS_NULL) as u8 + (!I2::IS_NULL) as u8;

    const LAYOUT_CHECK: () = {
        assert!(
            Self::TOTAL_ENDPOINTS_USED <= H::ENDPOINT_COUNT,
            "interfaces need more endpoints than the hardware has"
        );
        assert!(
            Self::CONFIG_TOTAL_LENGTH as usize <= MAX_CONFIG_LENGTH,
            "configuration descriptor too large"
        );
    };

    pub fn new(hardware: H, settings: UsbSettings) -> Self {
        let () = Self::LAYOUT_CHECK;

        debug!(
            "usb device {:04x}:{:04x}: {} endpoints, {} interfaces, {} descriptor bytes",
            settings.vendor_id,
            settings.product_id,
            Self::TOTAL_ENDPOINTS_USED,
            Self::TOTAL_INTERFACES_USED,
            Self::CONFIG_TOTAL_LENGTH
        );

        Self {
            hardware,
            settings,
            interface_0: I0::attach(Self::FIRST_ENDPOINT[0], Self::FIRST_INTERFACE[0]),
            interface_1: I1::attach(Self::FIRST_ENDPOINT[1], Self::FIRST_INTERFACE[1]),
            interface_2: I2::attach(Self::FIRST_ENDPOINT[2], Self::FIRST_INTERFACE[2]),
        }
    }

    /// Endpoints owned by the module at `position`, or `None` past the
    /// third position.
    pub const fn endpoint_range(position: usize) -> Option<Range<u8>> {
        let used = match position {
            0 => I0::ENDPOINTS_USED,
            1 => I1::ENDPOINTS_USED,
            2 => I2::ENDPOINTS_USED,
            _ => return None,
        };
        let first = Self::FIRST_ENDPOINT[position];
        Some(first..first + used)
    }

    /// First module endpoint and total endpoints in use.
    pub fn endpoint_count(&self) -> (u8, u8) {
        (Self::FIRST_ENDPOINT[0], Self::TOTAL_ENDPOINTS_USED)
    }

    pub fn settings(&self) -> &UsbSettings {
        &self.settings
    }

    pub fn hardware(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn interface_0(&self) -> &I0 {
        &self.interface_0
    }

    pub fn interface_1(&self) -> &I1 {
        &self.interface_1
    }

    pub fn interface_2(&self) -> &I2 {
        &self.interface_2
    }

    /// Bus speed the controller reports right now.
    pub fn speed(&self) -> UsbSpeed {
        self.hardware.speed()
    }

    fn control_packet_size(speed: UsbSpeed) -> u8 {
        match speed {
            UsbSpeed::Low => LOW_SPEED_CONTROL_SIZE,
            UsbSpeed::Full | UsbSpeed::High => H::CONTROL_ENDPOINT_SIZE,
        }
    }

    /// `bcdUSB` and device class triple: the IAD class when more than one
    /// module is active.
    fn identity() -> (Bcd16, u8, u8, u8) {
        if Self::ACTIVE_INTERFACES > 1 {
            (Bcd16::USB_1_1, IAD_CLASS, IAD_SUBCLASS, IAD_PROTOCOL)
        } else {
            (Bcd16::USB_2_0, 0, 0, 0)
        }
    }

    pub fn device_descriptor(&self) -> DeviceDescriptor {
        let (usb_version, class, subclass, protocol) = Self::identity();

        DeviceDescriptor {
            usb_version,
            class,
            subclass,
            protocol,
            max_packet_size0: Self::control_packet_size(self.speed()),
            vendor_id: self.settings.vendor_id,
            product_id: self.settings.product_id,
            device_version: self.settings.version,
            configurations: 1,
        }
    }

    /// The device descriptor as it would read on the other speed. Always
    /// reports USB 2.0, the first revision with qualifiers.
    pub fn device_qualifier(&self) -> DeviceQualifier {
        let (_, class, subclass, protocol) = Self::identity();

        DeviceQualifier {
            usb_version: Bcd16::USB_2_0,
            class,
            subclass,
            protocol,
            max_packet_size0: Self::control_packet_size(self.speed().other()),
            configurations: 1,
        }
    }

    /// Send the device descriptor, cut to the length the host asked for.
    pub fn send_descriptors(&mut self, max_length: u16) -> usize {
        let bytes = self.device_descriptor().to_bytes();
        let to_send = bytes.len().min(max_length as usize);
        self.hardware.write_control(&bytes[..to_send])
    }

    pub fn send_qualifier(&mut self, max_length: u16) -> usize {
        let bytes = self.device_qualifier().to_bytes();
        let to_send = bytes.len().min(max_length as usize);
        self.hardware.write_control(&bytes[..to_send])
    }

    /// Lay out the full configuration descriptor into `buf`.
    pub fn write_config(&self, buf: &mut [u8]) -> Result<usize, DescriptorError> {
        self.write_config_at(buf, descriptor_type::CONFIGURATION, self.speed())
    }

    /// Lay out the other-speed configuration descriptor into `buf`.
    pub fn write_other_speed_config(&self, buf: &mut [u8]) -> Result<usize, DescriptorError> {
        self.write_config_at(
            buf,
            descriptor_type::OTHER_SPEED_CONFIGURATION,
            self.speed().other(),
        )
    }

    fn write_config_at(
        &self,
        buf: &mut [u8],
        descriptor_type: u8,
        speed: UsbSpeed,
    ) -> Result<usize, DescriptorError> {
        let mut writer = DescriptorWriter::new(buf);
        writer.configuration(
            descriptor_type,
            Self::CONFIG_TOTAL_LENGTH,
            Self::TOTAL_INTERFACES_USED,
            self.settings.attributes,
            self.settings.power_ma,
        )?;
        self.interface_0.write_descriptors(&mut writer, speed)?;
        self.interface_1.write_descriptors(&mut writer, speed)?;
        self.interface_2.write_descriptors(&mut writer, speed)?;

        let written = writer.position();
        if written != Self::CONFIG_TOTAL_LENGTH as usize {
            return Err(DescriptorError::SizeMismatch {
                declared: Self::CONFIG_TOTAL_LENGTH,
                written,
            });
        }
        Ok(written)
    }

    /// Send the configuration descriptor, cut to the length the host asked
    /// for.
    pub fn send_config(&mut self, max_length: u16) -> Result<usize, DescriptorError> {
        let mut buf = [0u8; MAX_CONFIG_LENGTH];
        let length = self.write_config(&mut buf)?;
        let to_send = length.min(max_length as usize);
        Ok(self.hardware.write_control(&buf[..to_send]))
    }

    pub fn send_other_speed_config(&mut self, max_length: u16) -> Result<usize, DescriptorError> {
        let mut buf = [0u8; MAX_CONFIG_LENGTH];
        let length = self.write_other_speed_config(&mut buf)?;
        let to_send = length.min(max_length as usize);
        Ok(self.hardware.write_control(&buf[..to_send]))
    }

    /// Send string descriptor `index`: the language table for 0, then the
    /// manufacturer, product and serial number from the settings.
    pub fn send_string(&mut self, index: u8, max_length: u16) -> Result<usize, DescriptorError> {
        let text = match index {
            string_id::LANGUAGES => None,
            string_id::MANUFACTURER => Some(self.settings.manufacturer),
            string_id::PRODUCT => Some(self.settings.product),
            string_id::SERIAL_NUMBER => Some(self.settings.serial_number),
            _ => return Err(DescriptorError::UnknownString(index)),
        };

        let mut buf = [0u8; MAX_STRING_LENGTH];
        let mut writer = DescriptorWriter::new(&mut buf);
        match text {
            Some(text) => writer.string(text)?,
            None => writer.languages(&[LANGUAGE_EN_US])?,
        }
        let to_send = writer.position().min(max_length as usize);
        Ok(self.hardware.write_control(&buf[..to_send]))
    }

    /// Buffer settings for `endpoint` at the current speed: the control
    /// endpoint for 0, else whichever module claims it first.
    pub fn endpoint_config(&self, endpoint: u8) -> Option<EndpointConfig> {
        self.endpoint_config_at(endpoint, self.speed())
    }

    pub fn endpoint_config_at(&self, endpoint: u8, speed: UsbSpeed) -> Option<EndpointConfig> {
        if endpoint == 0 {
            return Some(EndpointConfig {
                number: 0,
                direction: EndpointDirection::Out,
                kind: EndpointType::Control,
                max_packet_size: Self::control_packet_size(speed) as u16,
                interval: 0,
            });
        }

        self.interface_0
            .endpoint_config(endpoint, speed)
            .or_else(|| self.interface_1.endpoint_config(endpoint, speed))
            .or_else(|| self.interface_2.endpoint_config(endpoint, speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::{CdcAcm, VendorBulk};

    struct Capture {
        sent: Vec<u8>,
        speed: UsbSpeed,
    }

    impl Default for Capture {
        fn default() -> Self {
            Self {
                sent: Vec::new(),
                speed: UsbSpeed::Full,
            }
        }
    }

    impl Capture {
        fn at(speed: UsbSpeed) -> Self {
            Self {
                speed,
                ..Self::default()
            }
        }
    }

    impl UsbHardware for Capture {
        const ENDPOINT_COUNT: u8 = 10;
        const CONTROL_ENDPOINT_SIZE: u8 = 64;

        fn speed(&self) -> UsbSpeed {
            self.speed
        }

        fn write_control(&mut self, data: &[u8]) -> usize {
            self.sent.extend_from_slice(data);
            data.len()
        }
    }

    #[test]
    fn single_interface_uses_no_device_class() {
        let mut device = UsbDevice::<Capture, VendorBulk>::new(
            Capture::default(),
            UsbSettings::default(),
        );
        assert_eq!(device.send_descriptors(0xFF), 18);

        let sent = &device.hardware().sent;
        assert_eq!(&sent[2..8], &[0x00, 0x02, 0, 0, 0, 64]);
    }

    #[test]
    fn device_descriptor_honours_the_requested_length() {
        let mut device = UsbDevice::<Capture, VendorBulk>::new(
            Capture::default(),
            UsbSettings::default(),
        );

        // First GET_DESCRIPTOR on a new device asks for 8 bytes.
        assert_eq!(device.send_descriptors(8), 8);
        assert_eq!(device.hardware().sent, [18, 0x01, 0x00, 0x02, 0, 0, 0, 64]);
    }

    #[test]
    fn low_speed_control_endpoint_is_eight_bytes() {
        let device = UsbDevice::<Capture, VendorBulk>::new(
            Capture::at(UsbSpeed::Low),
            UsbSettings::default(),
        );

        assert_eq!(device.device_descriptor().max_packet_size0, 8);
        assert_eq!(device.endpoint_config(0).map(|c| c.max_packet_size), Some(8));
        assert_eq!(device.device_qualifier().max_packet_size0, 8);
    }

    #[test]
    fn other_speed_config_uses_the_other_packet_sizes() {
        let device = UsbDevice::<Capture, VendorBulk>::new(
            Capture::at(UsbSpeed::High),
            UsbSettings::default(),
        );
        let mut here = [0u8; 64];
        let mut other = [0u8; 64];
        let length = device.write_config(&mut here).unwrap();

        assert_eq!(device.write_other_speed_config(&mut other), Ok(length));
        assert_eq!((here[1], other[1]), (0x02, 0x07));
        // Bulk OUT wMaxPacketSize: 512 here, 64 at full speed.
        assert_eq!(&here[9 + 9 + 4..][..2], &[0x00, 0x02]);
        assert_eq!(&other[9 + 9 + 4..][..2], &[64, 0x00]);
        assert_eq!(here[2..9], other[2..9]);
    }

    #[test]
    fn qualifier_mirrors_the_device_class() {
        let mut device = UsbDevice::<Capture, CdcAcm, VendorBulk>::new(
            Capture::at(UsbSpeed::Full),
            UsbSettings::default(),
        );

        assert_eq!(device.send_qualifier(0xFF), 10);
        assert_eq!(
            device.hardware().sent,
            [10, 0x06, 0x00, 0x02, 0xEF, 0x02, 0x01, 64, 1, 0]
        );
    }

    #[test]
    fn strings_come_from_the_settings() {
        let settings = UsbSettings {
            manufacturer: "Acme",
            ..UsbSettings::default()
        };
        let mut device = UsbDevice::<Capture, VendorBulk>::new(Capture::default(), settings);

        assert_eq!(device.send_string(0, 0xFF), Ok(4));
        assert_eq!(device.hardware().sent, [4, 0x03, 0x09, 0x04]);

        device.hardware().sent.clear();
        assert_eq!(device.send_string(string_id::MANUFACTURER, 0xFF), Ok(10));
        assert_eq!(
            device.hardware().sent,
            [10, 0x03, b'A', 0, b'c', 0, b'm', 0, b'e', 0]
        );

        device.hardware().sent.clear();
        assert_eq!(device.send_string(string_id::MANUFACTURER, 2), Ok(2));
        assert_eq!(device.hardware().sent, [10, 0x03]);

        assert_eq!(device.send_string(4, 0xFF), Err(DescriptorError::UnknownString(4)));
    }

    #[test]
    fn two_interfaces_use_interface_association() {
        let device = UsbDevice::<Capture, CdcAcm, VendorBulk>::new(
            Capture::default(),
            UsbSettings::default(),
        );
        let descriptor = device.device_descriptor();

        assert_eq!(descriptor.usb_version, Bcd16::USB_1_1);
        assert_eq!(
            (descriptor.class, descriptor.subclass, descriptor.protocol),
            (0xEF, 0x02, 0x01)
        );
    }

    #[test]
    fn explicit_null_positions_do_not_count() {
        type Device = UsbDevice<Capture, NullInterface, VendorBulk, NullInterface>;
        assert_eq!(Device::ACTIVE_INTERFACES, 1);
        assert_eq!(Device::FIRST_ENDPOINT, [1, 1, 3]);

        let device = Device::new(Capture::default(), UsbSettings::default());
        assert_eq!(device.device_descriptor().usb_version, Bcd16::USB_2_0);
        assert_eq!(device.interface_1().out_endpoint(), 1);
    }

    #[test]
    fn config_is_truncated_to_request() {
        let mut device = UsbDevice::<Capture, CdcAcm>::new(
            Capture::default(),
            UsbSettings::default(),
        );

        assert_eq!(device.send_config(9), Ok(9));
        assert_eq!(&device.hardware().sent[..4], &[9, 0x02, 75, 0]);

        device.hardware().sent.clear();
        assert_eq!(device.send_config(255), Ok(75));
        assert_eq!(device.hardware().sent.len(), 75);
    }

    #[test]
    fn endpoint_zero_is_control() {
        let device = UsbDevice::<Capture, VendorBulk>::new(
            Capture::default(),
            UsbSettings::default(),
        );
        let control = device.endpoint_config(0).unwrap();

        assert_eq!(control.kind, EndpointType::Control);
        assert_eq!(control.max_packet_size, 64);
        assert_eq!(device.endpoint_config(3), None);
    }

    #[test]
    fn ranges_are_contiguous() {
        type Device = UsbDevice<Capture, CdcAcm, VendorBulk, CdcAcm>;

        assert_eq!(Device::endpoint_range(0), Some(1..4));
        assert_eq!(Device::endpoint_range(1), Some(4..6));
        assert_eq!(Device::endpoint_range(2), Some(6..9));
        assert_eq!(Device::endpoint_range(3), None);
        assert_eq!(Device::TOTAL_ENDPOINTS_USED, 9);
        assert_eq!(Device::FIRST_INTERFACE, [0, 2, 3]);
    }
}
