use crate::buffer::Buffer;
use crate::checksum::crc32_ieee;
use crate::error::{Error, Result};
use crate::{fmt_payload, MacAddr};
use std::fmt::{Debug, Formatter};

const DESTINATION_OFFSET: usize = 0;
const SOURCE_OFFSET: usize = 6;
const ETHERTYPE_OFFSET: usize = 12;
const PAYLOAD_OFFSET: usize = 14;

/// The size of the `Ethernet II` header.
pub const HEADER_SIZE: usize = 14;

/// The size of the `CRC32` frame trailer.
pub const TRAILER_SIZE: usize = 4;

/// The minimum payload size, shorter payloads are zero padded.
pub const MIN_PAYLOAD_SIZE: usize = 46;

/// The maximum payload size, longer payloads are truncated.
pub const MAX_PAYLOAD_SIZE: usize = 1500;

/// The protocol carried in an `Ethernet II` frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EtherType {
    Ipv4,
    Arp,
    Ipv6,
    Other(u16),
}

impl EtherType {
    #[must_use]
    pub const fn id(self) -> u16 {
        match self {
            Self::Ipv4 => 0x0800,
            Self::Arp => 0x0806,
            Self::Ipv6 => 0x86DD,
            Self::Other(id) => id,
        }
    }

    /// Map a symbolic protocol name to an `EtherType`.
    ///
    /// `ICMP` travels inside `IPv4` and `NDP` inside `IPv6`, so they map to the
    /// `EtherType` of their network layer. Unrecognized names map to `0x0000`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "IP" | "ICMP" => Self::Ipv4,
            "ARP" => Self::Arp,
            "IPv6" | "NDP" => Self::Ipv6,
            _ => Self::Other(0x0000),
        }
    }
}

impl From<u16> for EtherType {
    fn from(id: u16) -> Self {
        match id {
            0x0800 => Self::Ipv4,
            0x0806 => Self::Arp,
            0x86DD => Self::Ipv6,
            id => Self::Other(id),
        }
    }
}

/// Represents an `Ethernet II` frame with its `CRC32` trailer.
#[derive(Clone, Eq, PartialEq)]
pub struct EthernetFrame {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
    pub crc: u32,
}

impl EthernetFrame {
    /// Create a frame for a symbolic protocol name such as `IP` or `ARP`.
    ///
    /// See [`EtherType::from_name`] for the recognized names.
    #[must_use]
    pub fn new(
        destination: MacAddr,
        source: MacAddr,
        ethertype_name: &str,
        payload: &[u8],
    ) -> Self {
        Self::with_ethertype(
            destination,
            source,
            EtherType::from_name(ethertype_name),
            payload,
        )
    }

    /// Create a frame for a given `EtherType`.
    ///
    /// A payload shorter than [`MIN_PAYLOAD_SIZE`] is zero padded and a payload
    /// longer than [`MAX_PAYLOAD_SIZE`] is truncated, silently discarding the
    /// trailing bytes. The `CRC32` trailer is computed over the normalized frame.
    #[must_use]
    pub fn with_ethertype(
        destination: MacAddr,
        source: MacAddr,
        ethertype: EtherType,
        payload: &[u8],
    ) -> Self {
        let payload = if payload.len() < MIN_PAYLOAD_SIZE {
            tracing::debug!(len = payload.len(), "padding ethernet payload");
            let mut padded = vec![0_u8; MIN_PAYLOAD_SIZE];
            padded[..payload.len()].copy_from_slice(payload);
            padded
        } else if payload.len() > MAX_PAYLOAD_SIZE {
            tracing::debug!(len = payload.len(), "truncating ethernet payload");
            payload[..MAX_PAYLOAD_SIZE].to_vec()
        } else {
            payload.to_vec()
        };
        let mut frame = Self {
            destination,
            source,
            ethertype,
            payload,
            crc: 0,
        };
        frame.crc = frame.compute_crc();
        frame
    }

    /// The smallest buffer that can hold a frame: header, minimum payload and trailer.
    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        HEADER_SIZE + MIN_PAYLOAD_SIZE + TRAILER_SIZE
    }

    /// The total wire length of this frame.
    #[must_use]
    pub fn packet_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = self.header_and_payload();
        bytes.extend_from_slice(&self.crc.to_be_bytes());
        bytes
    }

    /// Decode a frame, treating the final four bytes as the `CRC32` trailer.
    ///
    /// The trailer is not verified here, see [`EthernetFrame::validate_crc`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "EthernetFrame",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        let trailer_offset = data.len() - TRAILER_SIZE;
        Ok(Self {
            destination: MacAddr(buf.get_bytes(DESTINATION_OFFSET)),
            source: MacAddr(buf.get_bytes(SOURCE_OFFSET)),
            ethertype: EtherType::from(buf.get_u16(ETHERTYPE_OFFSET)),
            payload: data[PAYLOAD_OFFSET..trailer_offset].to_vec(),
            crc: buf.get_u32(trailer_offset),
        })
    }

    /// Recompute the `CRC32` over header and payload and compare it with the stored trailer.
    #[must_use]
    pub fn validate_crc(&self) -> bool {
        self.compute_crc() == self.crc
    }

    /// The `CRC32` of the destination, source, `EtherType` and payload.
    #[must_use]
    pub fn compute_crc(&self) -> u32 {
        crc32_ieee(&self.header_and_payload())
    }

    /// Is the payload length within the `Ethernet II` bounds?
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (MIN_PAYLOAD_SIZE..=MAX_PAYLOAD_SIZE).contains(&self.payload.len())
    }

    fn header_and_payload(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; HEADER_SIZE + self.payload.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_bytes(DESTINATION_OFFSET, self.destination.octets());
        buf.set_bytes(SOURCE_OFFSET, self.source.octets());
        buf.set_u16(ETHERTYPE_OFFSET, self.ethertype.id());
        buf.set_slice(PAYLOAD_OFFSET, &self.payload);
        bytes
    }
}

impl Debug for EthernetFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthernetFrame")
            .field("destination", &self.destination)
            .field("source", &self.source)
            .field("ethertype", &self.ethertype)
            .field("payload", &fmt_payload(&self.payload))
            .field("crc", &format_args!("{:#010x}", self.crc))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    const DST: MacAddr = MacAddr::BROADCAST;
    const SRC: MacAddr = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);

    #[test_case("IP", 0x0800; "ip")]
    #[test_case("ARP", 0x0806; "arp")]
    #[test_case("IPv6", 0x86DD; "ipv6")]
    #[test_case("NDP", 0x86DD; "ndp")]
    #[test_case("ICMP", 0x0800; "icmp")]
    #[test_case("IPX", 0x0000; "unknown")]
    #[test_case("ip", 0x0000; "names are case sensitive")]
    fn test_ethertype_from_name(name: &str, expected: u16) {
        assert_eq!(expected, EtherType::from_name(name).id());
    }

    #[test]
    fn test_ethertype_from_id() {
        assert_eq!(EtherType::Ipv4, EtherType::from(0x0800));
        assert_eq!(EtherType::Arp, EtherType::from(0x0806));
        assert_eq!(EtherType::Ipv6, EtherType::from(0x86DD));
        assert_eq!(EtherType::Other(0x88CC), EtherType::from(0x88CC));
    }

    #[test]
    fn test_padding() {
        let frame = EthernetFrame::new(DST, SRC, "IP", &[0xAB; 10]);
        let bytes = frame.serialize();
        assert_eq!(64, bytes.len());
        assert_eq!(&[0xAB; 10], &bytes[14..24]);
        assert_eq!(&[0x00; 36], &bytes[24..60]);
        assert_eq!(frame.crc.to_be_bytes(), bytes[60..64]);
        assert!(frame.validate_crc());
        assert!(frame.is_valid());
    }

    #[test]
    fn test_truncation() {
        let payload: Vec<u8> = (0..1600).map(|i| i as u8).collect();
        let frame = EthernetFrame::new(DST, SRC, "IP", &payload);
        assert_eq!(MAX_PAYLOAD_SIZE, frame.payload.len());
        assert_eq!(&payload[..MAX_PAYLOAD_SIZE], frame.payload.as_slice());
        assert_eq!(1518, frame.serialize().len());
        assert!(frame.validate_crc());
    }

    #[test]
    fn test_payload_bounds_unchanged() {
        let min = EthernetFrame::new(DST, SRC, "IP", &[0x11; MIN_PAYLOAD_SIZE]);
        assert_eq!(vec![0x11; MIN_PAYLOAD_SIZE], min.payload);
        let max = EthernetFrame::new(DST, SRC, "IP", &[0x22; MAX_PAYLOAD_SIZE]);
        assert_eq!(vec![0x22; MAX_PAYLOAD_SIZE], max.payload);
    }

    #[test]
    fn test_serialize_layout() {
        let frame = EthernetFrame::new(DST, SRC, "ARP", &[]);
        let bytes = frame.serialize();
        assert_eq!(hex!("ff ff ff ff ff ff"), bytes[..6]);
        assert_eq!(hex!("00 1a 2b 3c 4d 5e"), bytes[6..12]);
        assert_eq!(hex!("08 06"), bytes[12..14]);
        assert_eq!(0xac9e_6d44, frame.crc);
        assert_eq!(hex!("ac 9e 6d 44"), bytes[60..]);
    }

    #[test]
    fn test_crc_reference() {
        let frame = EthernetFrame::new(DST, SRC, "IP", b"hello");
        assert_eq!(0xca09_a16b, frame.crc);
    }

    #[test]
    fn test_round_trip() {
        let frame = EthernetFrame::new(DST, SRC, "IPv6", &[0x5A; 100]);
        let decoded = EthernetFrame::deserialize(&frame.serialize()).unwrap();
        assert_eq!(frame, decoded);
        assert!(decoded.validate_crc());
    }

    #[test]
    fn test_corrupt_frame() {
        let frame = EthernetFrame::new(DST, SRC, "IP", &[0x5A; 60]);
        let mut bytes = frame.serialize();
        bytes[20] ^= 0x01;
        let decoded = EthernetFrame::deserialize(&bytes).unwrap();
        assert!(!decoded.validate_crc());
    }

    #[test]
    fn test_corrupt_trailer() {
        let frame = EthernetFrame::new(DST, SRC, "IP", &[0x5A; 60]);
        let mut bytes = frame.serialize();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        let decoded = EthernetFrame::deserialize(&bytes).unwrap();
        assert!(!decoded.validate_crc());
    }

    #[test]
    fn test_jumbo_payload_decoded_as_is() {
        let bytes = vec![0_u8; HEADER_SIZE + 2000 + TRAILER_SIZE];
        let decoded = EthernetFrame::deserialize(&bytes).unwrap();
        assert_eq!(2000, decoded.payload.len());
        assert!(!decoded.is_valid());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = EthernetFrame::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = EthernetFrame::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("EthernetFrame"), SIZE, SIZE - 1),
            err
        );
    }
}
