use crate::buffer::Buffer;
use crate::checksum::ipv4_header_checksum;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_OFFSET: usize = 0;
const IHL_OFFSET: usize = 0;
const TOS_OFFSET: usize = 1;
const TOTAL_LENGTH_OFFSET: usize = 2;
const IDENTIFICATION_OFFSET: usize = 4;
const FLAGS_AND_FRAGMENT_OFFSET_OFFSET: usize = 6;
const TIME_TO_LIVE_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const CHECKSUM_OFFSET: usize = 10;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;
const OPTIONS_OFFSET: usize = 20;

/// The maximum size of the `IPv4` options area.
pub const MAX_OPTIONS_SIZE: usize = 40;

/// The default time-to-live of a new packet.
pub const DEFAULT_TTL: u8 = 64;

const DONT_FRAGMENT: u16 = 0x4000;
const MORE_FRAGMENTS: u16 = 0x2000;
const FRAGMENT_OFFSET_MASK: u16 = 0x1fff;

/// Represents an `IPv4` packet.
///
/// `header_length` is the raw IHL nibble, in 32-bit words. The header
/// checksum covers the header and options only, never the data.
#[derive(Clone, Eq, PartialEq)]
pub struct Ipv4Packet {
    pub version: u8,
    pub header_length: u8,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_and_fragment_offset: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub options: Vec<u8>,
    pub data: Vec<u8>,
}

impl Ipv4Packet {
    /// Create an `IPv4` packet without options.
    ///
    /// The total length is derived from `data` and the header checksum is
    /// computed.
    #[must_use]
    pub fn new(
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: IpProtocol,
        data: Vec<u8>,
    ) -> Self {
        let mut packet = Self {
            version: 4,
            header_length: 5,
            tos: 0,
            total_length: 0,
            identification: 0,
            flags_and_fragment_offset: 0,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            source,
            destination,
            options: Vec::new(),
            data,
        };
        packet.update_lengths();
        packet
    }

    /// Replace the options area.
    ///
    /// Options are zero padded to a multiple of 4 bytes and truncated to 40
    /// bytes. The header length, total length and checksum are updated.
    #[must_use]
    pub fn with_options(mut self, mut options: Vec<u8>) -> Self {
        if options.len() > MAX_OPTIONS_SIZE {
            tracing::debug!(
                provided = options.len(),
                max = MAX_OPTIONS_SIZE,
                "truncating ipv4 options"
            );
            options.truncate(MAX_OPTIONS_SIZE);
        }
        options.resize(options.len().next_multiple_of(4), 0);
        self.options = options;
        self.update_lengths();
        self
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    /// The header size in bytes, including options.
    #[must_use]
    pub fn header_size(&self) -> usize {
        header_size(self.header_length)
    }

    #[must_use]
    pub const fn dscp(&self) -> u8 {
        self.tos >> 2
    }

    #[must_use]
    pub const fn ecn(&self) -> u8 {
        self.tos & 0x3
    }

    #[must_use]
    pub const fn dont_fragment(&self) -> bool {
        self.flags_and_fragment_offset & DONT_FRAGMENT != 0
    }

    #[must_use]
    pub const fn more_fragments(&self) -> bool {
        self.flags_and_fragment_offset & MORE_FRAGMENTS != 0
    }

    /// The fragment offset in units of 8 bytes.
    #[must_use]
    pub const fn fragment_offset(&self) -> u16 {
        self.flags_and_fragment_offset & FRAGMENT_OFFSET_MASK
    }

    /// Serialize the packet, computing the header checksum.
    ///
    /// The header occupies `header_length` words; `options` are copied into
    /// the space after the fixed header and zero filled or cut to fit.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let header_size = self.header_size();
        let mut bytes = vec![0_u8; header_size + self.data.len()];
        self.write_header(&mut bytes[..header_size], 0);
        let checksum = ipv4_header_checksum(&bytes[..header_size]);
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_u16(CHECKSUM_OFFSET, checksum);
        buf.set_slice(header_size, &self.data);
        bytes
    }

    /// Decode an `IPv4` packet.
    ///
    /// The data extends to `total_length` when that is consistent with the
    /// header and the buffer, otherwise to the end of the buffer.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "Ipv4Packet",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        let header_length = buf.read(IHL_OFFSET) & 0xf;
        let header_size = header_size(header_length);
        if data.len() < header_size {
            return Err(Error::too_short("Ipv4Packet", header_size, data.len()));
        }
        let total_length = buf.get_u16(TOTAL_LENGTH_OFFSET);
        let end = usize::from(total_length);
        let end = if (header_size..=data.len()).contains(&end) {
            end
        } else {
            tracing::debug!(
                total_length,
                header_size,
                provided = data.len(),
                "ipv4 total length inconsistent with buffer, using remaining bytes"
            );
            data.len()
        };
        Ok(Self {
            version: buf.read(VERSION_OFFSET) >> 4,
            header_length,
            tos: buf.read(TOS_OFFSET),
            total_length,
            identification: buf.get_u16(IDENTIFICATION_OFFSET),
            flags_and_fragment_offset: buf.get_u16(FLAGS_AND_FRAGMENT_OFFSET_OFFSET),
            ttl: buf.read(TIME_TO_LIVE_OFFSET),
            protocol: IpProtocol::from(buf.read(PROTOCOL_OFFSET)),
            checksum: buf.get_u16(CHECKSUM_OFFSET),
            source: Ipv4Addr::from(buf.get_bytes(SOURCE_OFFSET)),
            destination: Ipv4Addr::from(buf.get_bytes(DESTINATION_OFFSET)),
            options: data[OPTIONS_OFFSET..header_size].to_vec(),
            data: data[header_size..end].to_vec(),
        })
    }

    /// The header checksum this packet should carry.
    #[must_use]
    pub fn compute_checksum(&self) -> u16 {
        let mut header = vec![0_u8; self.header_size()];
        self.write_header(&mut header, self.checksum);
        ipv4_header_checksum(&header)
    }

    #[must_use]
    pub fn validate_checksum(&self) -> bool {
        self.compute_checksum() == self.checksum
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.version == 4 && self.total_length >= 20
    }

    fn update_lengths(&mut self) {
        let options_words = u8::try_from(self.options.len() / 4).unwrap_or(u8::MAX);
        self.header_length = 5_u8.saturating_add(options_words);
        self.total_length =
            u16::try_from(self.header_size() + self.data.len()).unwrap_or(u16::MAX);
        self.checksum = self.compute_checksum();
    }

    fn write_header(&self, header: &mut [u8], checksum: u16) {
        let options_len = self.options.len().min(header.len() - OPTIONS_OFFSET);
        let mut buf = Buffer::Mutable(header);
        *buf.write(VERSION_OFFSET) = (self.version << 4) | (self.header_length & 0xf);
        *buf.write(TOS_OFFSET) = self.tos;
        buf.set_u16(TOTAL_LENGTH_OFFSET, self.total_length);
        buf.set_u16(IDENTIFICATION_OFFSET, self.identification);
        buf.set_u16(
            FLAGS_AND_FRAGMENT_OFFSET_OFFSET,
            self.flags_and_fragment_offset,
        );
        *buf.write(TIME_TO_LIVE_OFFSET) = self.ttl;
        *buf.write(PROTOCOL_OFFSET) = self.protocol.id();
        buf.set_u16(CHECKSUM_OFFSET, checksum);
        buf.set_bytes(SOURCE_OFFSET, self.source.octets());
        buf.set_bytes(DESTINATION_OFFSET, self.destination.octets());
        buf.set_slice(OPTIONS_OFFSET, &self.options[..options_len]);
    }
}

/// The header size in bytes for an IHL nibble, never less than the fixed header.
fn header_size(header_length: u8) -> usize {
    (usize::from(header_length & 0xf) * 4).max(Ipv4Packet::minimum_packet_size())
}

impl Debug for Ipv4Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.version)
            .field("header_length", &self.header_length)
            .field("tos", &self.tos)
            .field("total_length", &self.total_length)
            .field("identification", &self.identification)
            .field("flags_and_fragment_offset", &self.flags_and_fragment_offset)
            .field("ttl", &self.ttl)
            .field("protocol", &self.protocol)
            .field("checksum", &self.checksum)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("options", &fmt_payload(&self.options))
            .field("data", &fmt_payload(&self.data))
            .finish()
    }
}
