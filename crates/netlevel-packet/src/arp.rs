use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::MacAddr;
use std::net::Ipv4Addr;

const HARDWARE_TYPE_OFFSET: usize = 0;
const PROTOCOL_TYPE_OFFSET: usize = 2;
const HARDWARE_ADDR_LEN_OFFSET: usize = 4;
const PROTOCOL_ADDR_LEN_OFFSET: usize = 5;
const OPCODE_OFFSET: usize = 6;
const SENDER_HARDWARE_ADDR_OFFSET: usize = 8;
const SENDER_PROTOCOL_ADDR_OFFSET: usize = 14;
const TARGET_HARDWARE_ADDR_OFFSET: usize = 18;
const TARGET_PROTOCOL_ADDR_OFFSET: usize = 24;

/// The `ARP` hardware type for Ethernet.
pub const HARDWARE_TYPE_ETHERNET: u16 = 1;

/// The `IPv4` protocol type.
pub const PROTOCOL_TYPE_IPV4: u16 = 0x0800;

/// The `ARP` operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ArpOperation {
    Request,
    Reply,
    Other(u16),
}

impl ArpOperation {
    #[must_use]
    pub const fn id(self) -> u16 {
        match self {
            Self::Request => 1,
            Self::Reply => 2,
            Self::Other(id) => id,
        }
    }
}

impl From<u16> for ArpOperation {
    fn from(id: u16) -> Self {
        match id {
            1 => Self::Request,
            2 => Self::Reply,
            id => Self::Other(id),
        }
    }
}

/// Represents an `ARP` packet for `IPv4` over Ethernet.
///
/// The wire format is a fixed 28 bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ArpPacket {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_addr_len: u8,
    pub protocol_addr_len: u8,
    pub operation: ArpOperation,
    pub sender_hardware_addr: MacAddr,
    pub sender_protocol_addr: Ipv4Addr,
    pub target_hardware_addr: MacAddr,
    pub target_protocol_addr: Ipv4Addr,
}

impl ArpPacket {
    #[must_use]
    pub const fn new(
        operation: ArpOperation,
        sender_hardware_addr: MacAddr,
        sender_protocol_addr: Ipv4Addr,
        target_hardware_addr: MacAddr,
        target_protocol_addr: Ipv4Addr,
    ) -> Self {
        Self {
            hardware_type: HARDWARE_TYPE_ETHERNET,
            protocol_type: PROTOCOL_TYPE_IPV4,
            hardware_addr_len: 6,
            protocol_addr_len: 4,
            operation,
            sender_hardware_addr,
            sender_protocol_addr,
            target_hardware_addr,
            target_protocol_addr,
        }
    }

    /// Ask who has `target_protocol_addr`, the target hardware address is left unspecified.
    #[must_use]
    pub const fn request(
        sender_hardware_addr: MacAddr,
        sender_protocol_addr: Ipv4Addr,
        target_protocol_addr: Ipv4Addr,
    ) -> Self {
        Self::new(
            ArpOperation::Request,
            sender_hardware_addr,
            sender_protocol_addr,
            MacAddr::UNSPECIFIED,
            target_protocol_addr,
        )
    }

    /// Answer a request by swapping it around and filling in our hardware address.
    #[must_use]
    pub const fn reply(request: &Self, hardware_addr: MacAddr) -> Self {
        Self::new(
            ArpOperation::Reply,
            hardware_addr,
            request.target_protocol_addr,
            request.sender_hardware_addr,
            request.sender_protocol_addr,
        )
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        28
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size()];
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_u16(HARDWARE_TYPE_OFFSET, self.hardware_type);
        buf.set_u16(PROTOCOL_TYPE_OFFSET, self.protocol_type);
        *buf.write(HARDWARE_ADDR_LEN_OFFSET) = self.hardware_addr_len;
        *buf.write(PROTOCOL_ADDR_LEN_OFFSET) = self.protocol_addr_len;
        buf.set_u16(OPCODE_OFFSET, self.operation.id());
        buf.set_bytes(
            SENDER_HARDWARE_ADDR_OFFSET,
            self.sender_hardware_addr.octets(),
        );
        buf.set_bytes(
            SENDER_PROTOCOL_ADDR_OFFSET,
            self.sender_protocol_addr.octets(),
        );
        buf.set_bytes(
            TARGET_HARDWARE_ADDR_OFFSET,
            self.target_hardware_addr.octets(),
        );
        buf.set_bytes(
            TARGET_PROTOCOL_ADDR_OFFSET,
            self.target_protocol_addr.octets(),
        );
        bytes
    }

    /// Decode an `ARP` packet from the first 28 bytes of `data`.
    ///
    /// Any trailing bytes, such as Ethernet padding, are ignored.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "ArpPacket",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        Ok(Self {
            hardware_type: buf.get_u16(HARDWARE_TYPE_OFFSET),
            protocol_type: buf.get_u16(PROTOCOL_TYPE_OFFSET),
            hardware_addr_len: buf.read(HARDWARE_ADDR_LEN_OFFSET),
            protocol_addr_len: buf.read(PROTOCOL_ADDR_LEN_OFFSET),
            operation: ArpOperation::from(buf.get_u16(OPCODE_OFFSET)),
            sender_hardware_addr: MacAddr(buf.get_bytes(SENDER_HARDWARE_ADDR_OFFSET)),
            sender_protocol_addr: Ipv4Addr::from(buf.get_bytes(SENDER_PROTOCOL_ADDR_OFFSET)),
            target_hardware_addr: MacAddr(buf.get_bytes(TARGET_HARDWARE_ADDR_OFFSET)),
            target_protocol_addr: Ipv4Addr::from(buf.get_bytes(TARGET_PROTOCOL_ADDR_OFFSET)),
        })
    }

    /// Is this an `IPv4` over Ethernet packet?
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.hardware_type == HARDWARE_TYPE_ETHERNET
            && self.protocol_type == PROTOCOL_TYPE_IPV4
            && self.hardware_addr_len == 6
            && self.protocol_addr_len == 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SENDER_MAC: MacAddr = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);
    const SENDER_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
    const TARGET_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

    #[test]
    fn test_request_layout() {
        let packet = ArpPacket::request(SENDER_MAC, SENDER_IP, TARGET_IP);
        let bytes = packet.serialize();
        assert_eq!(28, bytes.len());
        assert_eq!(
            hex!(
                "00 01 08 00 06 04 00 01"
                "00 1a 2b 3c 4d 5e c0 a8 01 0a"
                "00 00 00 00 00 00 c0 a8 01 01"
            ),
            bytes.as_slice()
        );
        assert!(packet.is_valid());
    }

    #[test]
    fn test_reply() {
        let request = ArpPacket::request(SENDER_MAC, SENDER_IP, TARGET_IP);
        let gateway = MacAddr::new(0x02, 0, 0, 0, 0, 0x01);
        let reply = ArpPacket::reply(&request, gateway);
        assert_eq!(ArpOperation::Reply, reply.operation);
        assert_eq!(gateway, reply.sender_hardware_addr);
        assert_eq!(TARGET_IP, reply.sender_protocol_addr);
        assert_eq!(SENDER_MAC, reply.target_hardware_addr);
        assert_eq!(SENDER_IP, reply.target_protocol_addr);
        assert_eq!(hex!("00 02"), reply.serialize()[6..8]);
    }

    #[test]
    fn test_view() {
        let buf = hex!(
            "00 01 08 00 06 04 00 02"
            "de ad be ef 00 01 0a 00 00 01"
            "00 1a 2b 3c 4d 5e 0a 00 00 02"
            "00 00 00 00"
        );
        let packet = ArpPacket::deserialize(&buf).unwrap();
        assert_eq!(1, packet.hardware_type);
        assert_eq!(0x0800, packet.protocol_type);
        assert_eq!(6, packet.hardware_addr_len);
        assert_eq!(4, packet.protocol_addr_len);
        assert_eq!(ArpOperation::Reply, packet.operation);
        assert_eq!(
            MacAddr::new(0xde, 0xad, 0xbe, 0xef, 0x00, 0x01),
            packet.sender_hardware_addr
        );
        assert_eq!(Ipv4Addr::new(10, 0, 0, 1), packet.sender_protocol_addr);
        assert_eq!(SENDER_MAC, packet.target_hardware_addr);
        assert_eq!(Ipv4Addr::new(10, 0, 0, 2), packet.target_protocol_addr);
    }

    #[test]
    fn test_round_trip() {
        let packet = ArpPacket::new(
            ArpOperation::Other(8),
            SENDER_MAC,
            SENDER_IP,
            MacAddr::BROADCAST,
            TARGET_IP,
        );
        assert_eq!(packet, ArpPacket::deserialize(&packet.serialize()).unwrap());
    }

    #[test]
    fn test_new_ipv4_over_ethernet() {
        let bytes = ArpPacket::request(SENDER_MAC, SENDER_IP, TARGET_IP).serialize();
        assert_eq!(hex!("00 01 08 00 06 04 00 01"), bytes[..8]);
    }

    #[test]
    fn test_is_valid() {
        let mut packet = ArpPacket::request(SENDER_MAC, SENDER_IP, TARGET_IP);
        assert!(packet.is_valid());
        packet.hardware_type = 6;
        assert!(!packet.is_valid());
        packet.hardware_type = HARDWARE_TYPE_ETHERNET;
        packet.protocol_type = 0x86DD;
        assert!(!packet.is_valid());
        packet.protocol_type = PROTOCOL_TYPE_IPV4;
        packet.protocol_addr_len = 16;
        assert!(!packet.is_valid());
        packet.protocol_addr_len = 4;
        packet.hardware_addr_len = 8;
        assert!(!packet.is_valid());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = ArpPacket::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = ArpPacket::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("ArpPacket"), SIZE, SIZE - 1),
            err
        );
    }
}
