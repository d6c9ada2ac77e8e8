use super::descriptor::{DescriptorError, DescriptorWriter};
use super::{EndpointConfig, UsbSpeed};

/// A pluggable USB function owned by a [`UsbDevice`](super::UsbDevice).
///
/// The associated constants drive the build-time layout: the device hands
/// each module the first endpoint and interface number it may use, and
/// trusts it to use exactly `ENDPOINTS_USED` endpoints, `INTERFACES_USED`
/// interfaces and `DESCRIPTOR_SIZE` bytes of configuration descriptor.
pub trait UsbInterface: Sized {
    const ENDPOINTS_USED: u8;
    const INTERFACES_USED: u8;
    const DESCRIPTOR_SIZE: u16;

    /// `true` only for the placeholder that fills unused positions.
    const IS_NULL: bool = false;

    /// Build the module at its assigned position.
    fn attach(first_endpoint: u8, first_interface: u8) -> Self;

    /// Append this module's part of the configuration descriptor, with
    /// packet sizes for `speed`.
    fn write_descriptors(
        &self,
        writer: &mut DescriptorWriter<'_>,
        speed: UsbSpeed,
    ) -> Result<(), DescriptorError>;

    /// Buffer settings for `endpoint` at `speed`, if this module owns it.
    fn endpoint_config(&self, endpoint: u8, speed: UsbSpeed) -> Option<EndpointConfig>;
}

/// Empty module. Contributes nothing.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct NullInterface;

impl UsbInterface for NullInterface {
    const ENDPOINTS_USED: u8 = 0;
    const INTERFACES_USED: u8 = 0;
    const DESCRIPTOR_SIZE: u16 = 0;
    const IS_NULL: bool = true;

    fn attach(_first_endpoint: u8, _first_interface: u8) -> Self {
        NullInterface
    }

    fn write_descriptors(
        &self,
        _writer: &mut DescriptorWriter<'_>,
        _speed: UsbSpeed,
    ) -> Result<(), DescriptorError> {
        Ok(())
    }

    fn endpoint_config(&self, _endpoint: u8, _speed: UsbSpeed) -> Option<EndpointConfig> {
        None
    }
}
