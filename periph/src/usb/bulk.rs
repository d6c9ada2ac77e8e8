use super::descriptor::{
    DescriptorError, DescriptorWriter, ENDPOINT_LENGTH, INTERFACE_LENGTH,
};
use super::interface::UsbInterface;
use super::{EndpointConfig, EndpointDirection, EndpointType, UsbSpeed};

const VENDOR_SPECIFIC: u8 = 0xFF;

/// Vendor-specific interface with one bulk OUT and one bulk IN endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VendorBulk {
    interface: u8,
    out_endpoint: u8,
    in_endpoint: u8,
}

impl VendorBulk {
    pub fn interface_number(&self) -> u8 {
        self.interface
    }

    pub fn out_endpoint(&self) -> u8 {
        self.out_endpoint
    }

    pub fn in_endpoint(&self) -> u8 {
        self.in_endpoint
    }

    fn endpoints(&self, speed: UsbSpeed) -> [EndpointConfig; 2] {
        let max_packet_size = speed.bulk_packet_size();
        [
            EndpointConfig {
                number: self.out_endpoint,
                direction: EndpointDirection::Out,
                kind: EndpointType::Bulk,
                max_packet_size,
                interval: 0,
            },
            EndpointConfig {
                number: self.in_endpoint,
                direction: EndpointDirection::In,
                kind: EndpointType::Bulk,
                max_packet_size,
                interval: 0,
            },
        ]
    }
}

impl UsbInterface for VendorBulk {
    const ENDPOINTS_USED: u8 = 2;
    const INTERFACES_USED: u8 = 1;
    const DESCRIPTOR_SIZE: u16 = INTERFACE_LENGTH + 2 * ENDPOINT_LENGTH;

    fn attach(first_endpoint: u8, first_interface: u8) -> Self {
        Self {
            interface: first_interface,
            out_endpoint: first_endpoint,
            in_endpoint: first_endpoint + 1,
        }
    }

    fn write_descriptors(
        &self,
        writer: &mut DescriptorWriter<'_>,
        speed: UsbSpeed,
    ) -> Result<(), DescriptorError> {
        writer.interface(self.interface, Self::ENDPOINTS_USED, VENDOR_SPECIFIC, 0, 0)?;
        for endpoint in &self.endpoints(speed) {
            writer.endpoint(endpoint)?;
        }
        Ok(())
    }

    fn endpoint_config(&self, endpoint: u8, speed: UsbSpeed) -> Option<EndpointConfig> {
        self.endpoints(speed)
            .into_iter()
            .find(|config| config.number == endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_matches_declared_size() {
        let bulk = VendorBulk::attach(3, 1);
        let mut buf = [0u8; 64];
        let mut writer = DescriptorWriter::new(&mut buf);
        bulk.write_descriptors(&mut writer, UsbSpeed::Full).unwrap();

        assert_eq!(writer.position(), VendorBulk::DESCRIPTOR_SIZE as usize);
        assert_eq!(
            writer.written(),
            &[
                9, 0x04, 1, 0, 2, 0xFF, 0, 0, 0, //
                7, 0x05, 0x03, 0x02, 64, 0, 0, //
                7, 0x05, 0x84, 0x02, 64, 0, 0,
            ]
        );
    }

    #[test]
    fn owns_only_its_endpoints() {
        let bulk = VendorBulk::attach(1, 0);
        assert_eq!(
            bulk.endpoint_config(2, UsbSpeed::Full).map(|c| c.direction),
            Some(EndpointDirection::In)
        );
        assert!(bulk.endpoint_config(0, UsbSpeed::Full).is_none());
        assert!(bulk.endpoint_config(3, UsbSpeed::Full).is_none());
    }

    #[test]
    fn high_speed_bulk_packets_are_512_bytes() {
        let bulk = VendorBulk::attach(1, 0);
        for endpoint in [1, 2] {
            assert_eq!(
                bulk.endpoint_config(endpoint, UsbSpeed::High).map(|c| c.max_packet_size),
                Some(512)
            );
        }

        let mut buf = [0u8; 64];
        let mut writer = DescriptorWriter::new(&mut buf);
        bulk.write_descriptors(&mut writer, UsbSpeed::High).unwrap();
        assert_eq!(writer.position(), VendorBulk::DESCRIPTOR_SIZE as usize);
        assert_eq!(&writer.written()[9..16], &[7, 0x05, 0x01, 0x02, 0x00, 0x02, 0]);
    }
}
