use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv6Addr;

const VERSION_OFFSET: usize = 0;
const PAYLOAD_LENGTH_OFFSET: usize = 4;
const NEXT_HEADER_OFFSET: usize = 6;
const HOP_LIMIT_OFFSET: usize = 7;
const SOURCE_ADDRESS_OFFSET: usize = 8;
const DESTINATION_ADDRESS_OFFSET: usize = 24;
const DATA_OFFSET: usize = 40;

const FLOW_LABEL_MASK: u32 = 0x000f_ffff;

/// The default hop limit of a new packet.
pub const DEFAULT_HOP_LIMIT: u8 = 64;

/// Represents an `IPv6` packet.
///
/// The first 32 bits hold the 4-bit version, the 8-bit traffic class and the
/// 20-bit flow label. There is no header checksum.
#[derive(Clone, Eq, PartialEq)]
pub struct Ipv6Packet {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: IpProtocol,
    pub hop_limit: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub data: Vec<u8>,
}

impl Ipv6Packet {
    #[must_use]
    pub fn new(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        next_header: IpProtocol,
        data: Vec<u8>,
    ) -> Self {
        Self {
            version: 6,
            traffic_class: 0,
            flow_label: 0,
            payload_length: u16::try_from(data.len()).unwrap_or(u16::MAX),
            next_header,
            hop_limit: DEFAULT_HOP_LIMIT,
            source,
            destination,
            data,
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        40
    }

    /// Serialize the packet.
    ///
    /// Flow label bits above the low 20 are discarded.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.data.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        let first_word = (u32::from(self.version & 0xf) << 28)
            | (u32::from(self.traffic_class) << 20)
            | (self.flow_label & FLOW_LABEL_MASK);
        buf.set_u32(VERSION_OFFSET, first_word);
        buf.set_u16(PAYLOAD_LENGTH_OFFSET, self.payload_length);
        *buf.write(NEXT_HEADER_OFFSET) = self.next_header.id();
        *buf.write(HOP_LIMIT_OFFSET) = self.hop_limit;
        buf.set_bytes(SOURCE_ADDRESS_OFFSET, self.source.octets());
        buf.set_bytes(DESTINATION_ADDRESS_OFFSET, self.destination.octets());
        buf.set_slice(DATA_OFFSET, &self.data);
        bytes
    }

    /// Decode an `IPv6` packet, everything after the fixed header is data.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "Ipv6Packet",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        let first_word = buf.get_u32(VERSION_OFFSET);
        Ok(Self {
            version: (first_word >> 28) as u8,
            traffic_class: (first_word >> 20) as u8,
            flow_label: first_word & FLOW_LABEL_MASK,
            payload_length: buf.get_u16(PAYLOAD_LENGTH_OFFSET),
            next_header: IpProtocol::from(buf.read(NEXT_HEADER_OFFSET)),
            hop_limit: buf.read(HOP_LIMIT_OFFSET),
            source: Ipv6Addr::from(buf.get_bytes(SOURCE_ADDRESS_OFFSET)),
            destination: Ipv6Addr::from(buf.get_bytes(DESTINATION_ADDRESS_OFFSET)),
            data: data[DATA_OFFSET..].to_vec(),
        })
    }

    /// Is this version 6 with a payload length the carried data can satisfy?
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.version == 6 && usize::from(self.payload_length) <= self.data.len()
    }
}

impl Debug for Ipv6Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv6Packet")
            .field("version", &self.version)
            .field("traffic_class", &self.traffic_class)
            .field("flow_label", &self.flow_label)
            .field("payload_length", &self.payload_length)
            .field("next_header", &self.next_header)
            .field("hop_limit", &self.hop_limit)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("data", &fmt_payload(&self.data))
            .finish()
    }
}
