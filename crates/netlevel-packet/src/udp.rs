use crate::buffer::Buffer;
use crate::checksum::internet_checksum_with_pseudo_header;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const SOURCE_PORT_OFFSET: usize = 0;
const DESTINATION_PORT_OFFSET: usize = 2;
const LENGTH_OFFSET: usize = 4;
const CHECKSUM_OFFSET: usize = 6;
const DATA_OFFSET: usize = 8;

/// Represents a `UDP` datagram.
#[derive(Clone, Eq, PartialEq)]
pub struct UdpDatagram {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
    pub checksum: u16,
    pub data: Vec<u8>,
}

impl UdpDatagram {
    /// Create a `UDP` datagram with `length` derived from `data` and a zero
    /// checksum.
    #[must_use]
    pub fn new(source_port: u16, destination_port: u16, data: Vec<u8>) -> Self {
        Self {
            source_port,
            destination_port,
            length: datagram_length(&data),
            checksum: 0,
            data,
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        8
    }

    /// Serialize the datagram, computing the checksum over the `IPv4`
    /// pseudo-header, the header and the data.
    ///
    /// The length field is always written as 8 plus the data length.
    #[must_use]
    pub fn serialize(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> Vec<u8> {
        let length = datagram_length(&self.data);
        let mut bytes = self.serialize_with(length, 0);
        let checksum = internet_checksum_with_pseudo_header(
            &bytes,
            src_addr,
            dest_addr,
            IpProtocol::Udp,
            length,
        );
        Buffer::Mutable(&mut bytes).set_u16(CHECKSUM_OFFSET, checksum);
        bytes
    }

    /// Decode a `UDP` datagram.
    ///
    /// The data extends to `length` when that is consistent with the buffer,
    /// otherwise to the end of the buffer.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "UdpDatagram",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        let length = buf.get_u16(LENGTH_OFFSET);
        let end = usize::from(length);
        let end = if (DATA_OFFSET..=data.len()).contains(&end) {
            end
        } else {
            tracing::debug!(
                length,
                provided = data.len(),
                "udp length inconsistent with buffer, using remaining bytes"
            );
            data.len()
        };
        Ok(Self {
            source_port: buf.get_u16(SOURCE_PORT_OFFSET),
            destination_port: buf.get_u16(DESTINATION_PORT_OFFSET),
            length,
            checksum: buf.get_u16(CHECKSUM_OFFSET),
            data: data[DATA_OFFSET..end].to_vec(),
        })
    }

    /// The checksum this datagram should carry between the given addresses.
    ///
    /// The stored `length` is used both in the header and in the
    /// pseudo-header, so a corrupted length field is detected.
    #[must_use]
    pub fn checksum(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
        let bytes = self.serialize_with(self.length, 0);
        internet_checksum_with_pseudo_header(
            &bytes,
            src_addr,
            dest_addr,
            IpProtocol::Udp,
            self.length,
        )
    }

    #[must_use]
    pub fn validate_checksum(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> bool {
        self.checksum(src_addr, dest_addr) == self.checksum
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.source_port != 0 && self.destination_port != 0 && self.length >= 8
    }

    fn serialize_with(&self, length: u16, checksum: u16) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.data.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_u16(SOURCE_PORT_OFFSET, self.source_port);
        buf.set_u16(DESTINATION_PORT_OFFSET, self.destination_port);
        buf.set_u16(LENGTH_OFFSET, length);
        buf.set_u16(CHECKSUM_OFFSET, checksum);
        buf.set_slice(DATA_OFFSET, &self.data);
        bytes
    }
}

fn datagram_length(data: &[u8]) -> u16 {
    u16::try_from(UdpDatagram::minimum_packet_size() + data.len()).unwrap_or(u16::MAX)
}

impl Debug for UdpDatagram {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpDatagram")
            .field("source_port", &self.source_port)
            .field("destination_port", &self.destination_port)
            .field("length", &self.length)
            .field("checksum", &self.checksum)
            .field("data", &fmt_payload(&self.data))
            .finish()
    }
}
