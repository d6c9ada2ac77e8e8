use super::descriptor::{
    DescriptorError, DescriptorWriter, ENDPOINT_LENGTH, IAD_LENGTH, INTERFACE_LENGTH,
};
use super::descriptor_type::CS_INTERFACE;
use super::interface::UsbInterface;
use super::{EndpointConfig, EndpointDirection, EndpointType, UsbSpeed};

const CLASS_COMM: u8 = 0x02;
const CLASS_DATA: u8 = 0x0A;
const SUBCLASS_ACM: u8 = 0x02;
const PROTOCOL_AT: u8 = 0x01;

const FUNC_HEADER: u8 = 0x00;
const FUNC_CALL_MANAGEMENT: u8 = 0x01;
const FUNC_ACM: u8 = 0x02;
const FUNC_UNION: u8 = 0x06;

/// SET_LINE_CODING, GET_LINE_CODING, SET_CONTROL_LINE_STATE, SERIAL_STATE.
const ACM_CAPABILITIES: u8 = 0x06;

const FUNCTIONAL_LENGTH: u16 = 5 + 5 + 4 + 5;

const NOTIFY_PACKET: u16 = 16;
const NOTIFY_INTERVAL: u8 = 8;

/// CDC-ACM virtual serial port: a communication interface with an
/// interrupt notification endpoint and a data interface with a bulk pair,
/// bound together by an Interface Association Descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CdcAcm {
    comm_interface: u8,
    notify_endpoint: u8,
    data_out_endpoint: u8,
    data_in_endpoint: u8,
}

impl CdcAcm {
    pub fn comm_interface(&self) -> u8 {
        self.comm_interface
    }

    pub fn data_interface(&self) -> u8 {
        self.comm_interface + 1
    }

    fn notify(&self) -> EndpointConfig {
        EndpointConfig {
            number: self.notify_endpoint,
            direction: EndpointDirection::In,
            kind: EndpointType::Interrupt,
            max_packet_size: NOTIFY_PACKET,
            interval: NOTIFY_INTERVAL,
        }
    }

    fn data(&self, speed: UsbSpeed) -> [EndpointConfig; 2] {
        let max_packet_size = speed.bulk_packet_size();
        [
            EndpointConfig {
                number: self.data_out_endpoint,
                direction: EndpointDirection::Out,
                kind: EndpointType::Bulk,
                max_packet_size,
                interval: 0,
            },
            EndpointConfig {
                number: self.data_in_endpoint,
                direction: EndpointDirection::In,
                kind: EndpointType::Bulk,
                max_packet_size,
                interval: 0,
            },
        ]
    }
}

impl UsbInterface for CdcAcm {
    const ENDPOINTS_USED: u8 = 3;
    const INTERFACES_USED: u8 = 2;
    const DESCRIPTOR_SIZE: u16 =
        IAD_LENGTH + 2 * INTERFACE_LENGTH + FUNCTIONAL_LENGTH + 3 * ENDPOINT_LENGTH;

    fn attach(first_endpoint: u8, first_interface: u8) -> Self {
        Self {
            comm_interface: first_interface,
            notify_endpoint: first_endpoint,
            data_out_endpoint: first_endpoint + 1,
            data_in_endpoint: first_endpoint + 2,
        }
    }

    fn write_descriptors(
        &self,
        writer: &mut DescriptorWriter<'_>,
        speed: UsbSpeed,
    ) -> Result<(), DescriptorError> {
        let comm = self.comm_interface;
        let data = self.data_interface();

        writer.interface_association(comm, 2, CLASS_COMM, SUBCLASS_ACM, PROTOCOL_AT)?;

        writer.interface(comm, 1, CLASS_COMM, SUBCLASS_ACM, PROTOCOL_AT)?;
        writer.write(CS_INTERFACE, &[FUNC_HEADER, 0x10, 0x01])?;
        writer.write(CS_INTERFACE, &[FUNC_CALL_MANAGEMENT, 0x00, data])?;
        writer.write(CS_INTERFACE, &[FUNC_ACM, ACM_CAPABILITIES])?;
        writer.write(CS_INTERFACE, &[FUNC_UNION, comm, data])?;
        writer.endpoint(&self.notify())?;

        writer.interface(data, 2, CLASS_DATA, 0, 0)?;
        for endpoint in &self.data(speed) {
            writer.endpoint(endpoint)?;
        }
        Ok(())
    }

    fn endpoint_config(&self, endpoint: u8, speed: UsbSpeed) -> Option<EndpointConfig> {
        let [out, inp] = self.data(speed);
        [self.notify(), out, inp]
            .into_iter()
            .find(|config| config.number == endpoint)
    }
}
