use crate::buffer::Buffer;
use crate::checksum::icmpv6_checksum;
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};
use std::net::Ipv6Addr;

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;
const RESERVED_OFFSET: usize = 4;
const TARGET_ADDRESS_OFFSET: usize = 8;
const OPTIONS_OFFSET: usize = 24;

/// The type of `NDP` message.
///
/// Neighbor discovery messages are `ICMPv6` types 133 to 136 inclusive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NdpType {
    RouterSolicitation,
    RouterAdvertisement,
    NeighborSolicitation,
    NeighborAdvertisement,
    Other(u8),
}

impl NdpType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::RouterSolicitation => 133,
            Self::RouterAdvertisement => 134,
            Self::NeighborSolicitation => 135,
            Self::NeighborAdvertisement => 136,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for NdpType {
    fn from(id: u8) -> Self {
        match id {
            133 => Self::RouterSolicitation,
            134 => Self::RouterAdvertisement,
            135 => Self::NeighborSolicitation,
            136 => Self::NeighborAdvertisement,
            id => Self::Other(id),
        }
    }
}

/// Represents an `NDP` packet.
///
/// A fixed 24-byte header (type, code, checksum, reserved, target address)
/// followed by a variable length options tail.
#[derive(Clone, Eq, PartialEq)]
pub struct NdpPacket {
    pub ndp_type: NdpType,
    pub code: u8,
    pub checksum: u16,
    pub reserved: u32,
    pub target_address: Ipv6Addr,
    pub options: Vec<u8>,
}

impl NdpPacket {
    /// Create an `NDP` packet with a zero checksum and reserved field.
    #[must_use]
    pub const fn new(
        ndp_type: NdpType,
        code: u8,
        target_address: Ipv6Addr,
        options: Vec<u8>,
    ) -> Self {
        Self {
            ndp_type,
            code,
            checksum: 0,
            reserved: 0,
            target_address,
            options,
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        24
    }

    /// Serialize with the stored checksum.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.options.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        *buf.write(TYPE_OFFSET) = self.ndp_type.id();
        *buf.write(CODE_OFFSET) = self.code;
        buf.set_u16(CHECKSUM_OFFSET, self.checksum);
        buf.set_u32(RESERVED_OFFSET, self.reserved);
        buf.set_bytes(TARGET_ADDRESS_OFFSET, self.target_address.octets());
        buf.set_slice(OPTIONS_OFFSET, &self.options);
        bytes
    }

    /// Serialize with the `ICMPv6` checksum computed over the `IPv6` pseudo-header.
    #[must_use]
    pub fn serialize_with_checksum(&self, src_addr: Ipv6Addr, dest_addr: Ipv6Addr) -> Vec<u8> {
        let mut bytes = self.serialize();
        let checksum = icmpv6_checksum(&bytes, src_addr, dest_addr);
        Buffer::Mutable(&mut bytes).set_u16(CHECKSUM_OFFSET, checksum);
        bytes
    }

    /// The `ICMPv6` checksum of this packet between the given addresses.
    #[must_use]
    pub fn compute_checksum(&self, src_addr: Ipv6Addr, dest_addr: Ipv6Addr) -> u16 {
        icmpv6_checksum(&self.serialize(), src_addr, dest_addr)
    }

    #[must_use]
    pub fn validate_checksum(&self, src_addr: Ipv6Addr, dest_addr: Ipv6Addr) -> bool {
        self.compute_checksum(src_addr, dest_addr) == self.checksum
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "NdpPacket",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        Ok(Self {
            ndp_type: NdpType::from(buf.read(TYPE_OFFSET)),
            code: buf.read(CODE_OFFSET),
            checksum: buf.get_u16(CHECKSUM_OFFSET),
            reserved: buf.get_u32(RESERVED_OFFSET),
            target_address: Ipv6Addr::from(buf.get_bytes(TARGET_ADDRESS_OFFSET)),
            options: data[OPTIONS_OFFSET..].to_vec(),
        })
    }

    /// Is the type one of the four neighbor discovery messages?
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.ndp_type.id(), 133..=136)
    }
}

impl Debug for NdpPacket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdpPacket")
            .field("ndp_type", &self.ndp_type)
            .field("code", &self.code)
            .field("checksum", &self.checksum)
            .field("reserved", &self.reserved)
            .field("target_address", &self.target_address)
            .field("options", &fmt_payload(&self.options))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(132, false; "below range")]
    #[test_case(133, true; "router solicitation")]
    #[test_case(134, true; "router advertisement")]
    #[test_case(135, true; "neighbor solicitation")]
    #[test_case(136, true; "neighbor advertisement")]
    #[test_case(137, false; "redirect is not in range")]
    fn test_is_valid(id: u8, expected: bool) {
        let packet = NdpPacket::new(NdpType::from(id), 0, Ipv6Addr::UNSPECIFIED, vec![]);
        assert_eq!(expected, packet.is_valid());
    }

    #[test]
    fn test_view() {
        let buf = hex!(
            "88 00 73 6a 40 00 00 00"
            "fe 80 00 00 00 00 00 00 08 11 03 f6 76 01 6c 3f"
            "02 01 00 1a 2b 3c 4d 5e"
        );
        let packet = NdpPacket::deserialize(&buf).unwrap();
        assert_eq!(NdpType::NeighborAdvertisement, packet.ndp_type);
        assert_eq!(0, packet.code);
        assert_eq!(0x736a, packet.checksum);
        assert_eq!(0x4000_0000, packet.reserved);
        assert_eq!(
            Ipv6Addr::from_str("fe80::811:3f6:7601:6c3f").unwrap(),
            packet.target_address
        );
        assert_eq!(hex!("02 01 00 1a 2b 3c 4d 5e"), packet.options.as_slice());
    }

    #[test]
    fn test_checksum() {
        let src_addr = Ipv6Addr::from_str("fe80::811:3f6:7601:6c3f").unwrap();
        let dest_addr = Ipv6Addr::from_str("fe80::1c8d:7d69:d0b6:8182").unwrap();
        let mut packet = NdpPacket::new(
            NdpType::NeighborAdvertisement,
            0,
            Ipv6Addr::from_str("fe80::811:3f6:7601:6c3f").unwrap(),
            vec![],
        );
        packet.reserved = 0x4000_0000;
        let bytes = packet.serialize_with_checksum(src_addr, dest_addr);
        assert_eq!(hex!("73 6a"), bytes[2..4]);
        let decoded = NdpPacket::deserialize(&bytes).unwrap();
        assert!(decoded.validate_checksum(src_addr, dest_addr));
        assert!(!decoded.validate_checksum(dest_addr, dest_addr));
    }

    #[test]
    fn test_round_trip() {
        let packet = NdpPacket::new(
            NdpType::NeighborSolicitation,
            0,
            Ipv6Addr::from_str("2001:db8::1").unwrap(),
            vec![0x01, 0x01, 0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e],
        );
        let bytes = packet.serialize();
        assert_eq!(32, bytes.len());
        assert_eq!(packet, NdpPacket::deserialize(&bytes).unwrap());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = NdpPacket::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = NdpPacket::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("NdpPacket"), SIZE, SIZE - 1),
            err
        );
    }
}
