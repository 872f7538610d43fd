use crate::buffer::Buffer;
use crate::checksum::{icmp_checksum, internet_checksum};
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;
const IDENTIFIER_OFFSET: usize = 4;
const SEQUENCE_OFFSET: usize = 6;
const DATA_OFFSET: usize = 8;

/// The type of `ICMP` packet.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpType {
    EchoReply,
    DestinationUnreachable,
    EchoRequest,
    TimeExceeded,
    Other(u8),
}

impl IcmpType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::EchoReply => 0,
            Self::DestinationUnreachable => 3,
            Self::EchoRequest => 8,
            Self::TimeExceeded => 11,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::EchoReply,
            3 => Self::DestinationUnreachable,
            8 => Self::EchoRequest,
            11 => Self::TimeExceeded,
            id => Self::Other(id),
        }
    }
}

/// The `ICMP` code.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct IcmpCode(pub u8);

impl From<u8> for IcmpCode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

/// Represents an `ICMP` packet.
///
/// An 8-byte header (type, code, checksum, identifier, sequence) followed by
/// variable length data. The checksum covers the whole packet.
#[derive(Clone, Eq, PartialEq)]
pub struct IcmpPacket {
    pub icmp_type: IcmpType,
    pub icmp_code: IcmpCode,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
    pub data: Vec<u8>,
}

impl IcmpPacket {
    /// Create an `ICMP` packet with a computed checksum.
    #[must_use]
    pub fn new(
        icmp_type: IcmpType,
        icmp_code: IcmpCode,
        identifier: u16,
        sequence: u16,
        data: Vec<u8>,
    ) -> Self {
        let mut packet = Self {
            icmp_type,
            icmp_code,
            checksum: 0,
            identifier,
            sequence,
            data,
        };
        packet.checksum = packet.compute_checksum();
        packet
    }

    /// An echo request (ping).
    #[must_use]
    pub fn echo_request(identifier: u16, sequence: u16, data: Vec<u8>) -> Self {
        Self::new(IcmpType::EchoRequest, IcmpCode(0), identifier, sequence, data)
    }

    /// An echo reply (ping response).
    #[must_use]
    pub fn echo_reply(identifier: u16, sequence: u16, data: Vec<u8>) -> Self {
        Self::new(IcmpType::EchoReply, IcmpCode(0), identifier, sequence, data)
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        8
    }

    /// Serialize the packet, computing the checksum over the whole buffer.
    ///
    /// The stored `checksum` is not used.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = self.serialize_with(0);
        let checksum = internet_checksum(&bytes);
        Buffer::Mutable(&mut bytes).set_u16(CHECKSUM_OFFSET, checksum);
        bytes
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "IcmpPacket",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        Ok(Self {
            icmp_type: IcmpType::from(buf.read(TYPE_OFFSET)),
            icmp_code: IcmpCode::from(buf.read(CODE_OFFSET)),
            checksum: buf.get_u16(CHECKSUM_OFFSET),
            identifier: buf.get_u16(IDENTIFIER_OFFSET),
            sequence: buf.get_u16(SEQUENCE_OFFSET),
            data: data[DATA_OFFSET..].to_vec(),
        })
    }

    /// The checksum this packet should carry.
    #[must_use]
    pub fn compute_checksum(&self) -> u16 {
        icmp_checksum(&self.serialize_with(self.checksum))
    }

    /// Does the stored checksum match the packet contents?
    #[must_use]
    pub fn validate_checksum(&self) -> bool {
        self.compute_checksum() == self.checksum
    }

    /// Every combination of 8-bit type and code is accepted.
    ///
    /// Checking the (type, code) pair against the known combinations is left
    /// to the caller.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn is_valid(&self) -> bool {
        true
    }

    fn serialize_with(&self, checksum: u16) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.data.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        *buf.write(TYPE_OFFSET) = self.icmp_type.id();
        *buf.write(CODE_OFFSET) = self.icmp_code.0;
        buf.set_u16(CHECKSUM_OFFSET, checksum);
        buf.set_u16(IDENTIFIER_OFFSET, self.identifier);
        buf.set_u16(SEQUENCE_OFFSET, self.sequence);
        buf.set_slice(DATA_OFFSET, &self.data);
        bytes
    }
}

impl Debug for IcmpPacket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPacket")
            .field("icmp_type", &self.icmp_type)
            .field("icmp_code", &self.icmp_code)
            .field("checksum", &self.checksum)
            .field("identifier", &self.identifier)
            .field("sequence", &self.sequence)
            .field("data", &fmt_payload(&self.data))
            .finish()
    }
}
