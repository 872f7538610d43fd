use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

const ID_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = 2;
const QUESTION_COUNT_OFFSET: usize = 4;
const ANSWER_COUNT_OFFSET: usize = 6;
const AUTHORITY_COUNT_OFFSET: usize = 8;
const ADDITIONAL_COUNT_OFFSET: usize = 10;
const PAYLOAD_OFFSET: usize = 12;

const QR_MASK: u16 = 0x8000;
const OPCODE_SHIFT: u16 = 11;
const RCODE_MASK: u16 = 0x000f;

/// Represents a `DNS` message header.
///
/// The question, answer, authority and additional sections are carried as an
/// opaque payload.
#[derive(Clone, Eq, PartialEq)]
pub struct DnsMessage {
    pub id: u16,
    pub flags: u16,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
    pub payload: Vec<u8>,
}

impl DnsMessage {
    #[must_use]
    pub const fn new(
        id: u16,
        flags: u16,
        question_count: u16,
        answer_count: u16,
        authority_count: u16,
        additional_count: u16,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id,
            flags,
            question_count,
            answer_count,
            authority_count,
            additional_count,
            payload,
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        12
    }

    /// Is the QR bit set?
    #[must_use]
    pub const fn is_response(&self) -> bool {
        self.flags & QR_MASK != 0
    }

    #[must_use]
    pub const fn opcode(&self) -> u8 {
        ((self.flags >> OPCODE_SHIFT) & 0xf) as u8
    }

    #[must_use]
    pub const fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.payload.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_u16(ID_OFFSET, self.id);
        buf.set_u16(FLAGS_OFFSET, self.flags);
        buf.set_u16(QUESTION_COUNT_OFFSET, self.question_count);
        buf.set_u16(ANSWER_COUNT_OFFSET, self.answer_count);
        buf.set_u16(AUTHORITY_COUNT_OFFSET, self.authority_count);
        buf.set_u16(ADDITIONAL_COUNT_OFFSET, self.additional_count);
        buf.set_slice(PAYLOAD_OFFSET, &self.payload);
        bytes
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "DnsMessage",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        Ok(Self {
            id: buf.get_u16(ID_OFFSET),
            flags: buf.get_u16(FLAGS_OFFSET),
            question_count: buf.get_u16(QUESTION_COUNT_OFFSET),
            answer_count: buf.get_u16(ANSWER_COUNT_OFFSET),
            authority_count: buf.get_u16(AUTHORITY_COUNT_OFFSET),
            additional_count: buf.get_u16(ADDITIONAL_COUNT_OFFSET),
            payload: data[PAYLOAD_OFFSET..].to_vec(),
        })
    }

    /// Does the header declare at least one record in any section?
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.question_count > 0
            || self.answer_count > 0
            || self.authority_count > 0
            || self.additional_count > 0
    }
}

impl Debug for DnsMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsMessage")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("question_count", &self.question_count)
            .field("answer_count", &self.answer_count)
            .field("authority_count", &self.authority_count)
            .field("additional_count", &self.additional_count)
            .field("payload", &fmt_payload(&self.payload))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_view() {
        let buf = hex!(
            "ab cd 81 80 00 01 00 01 00 00 00 00"
            "07 65 78 61 6d 70 6c 65 03 63 6f 6d 00 00 01 00 01"
        );
        let message = DnsMessage::deserialize(&buf).unwrap();
        assert_eq!(0xabcd, message.id);
        assert_eq!(0x8180, message.flags);
        assert!(message.is_response());
        assert_eq!(0, message.opcode());
        assert_eq!(0, message.rcode());
        assert_eq!(1, message.question_count);
        assert_eq!(1, message.answer_count);
        assert_eq!(0, message.authority_count);
        assert_eq!(0, message.additional_count);
        assert_eq!(17, message.payload.len());
        assert!(message.is_valid());
    }

    #[test]
    fn test_flags() {
        let message = DnsMessage::new(1, 0x2803, 0, 0, 0, 0, vec![]);
        assert!(!message.is_response());
        assert_eq!(5, message.opcode());
        assert_eq!(3, message.rcode());
    }

    #[test]
    fn test_serialize() {
        let message = DnsMessage::new(0x1234, 0x0100, 1, 0, 0, 1, vec![0xff]);
        assert_eq!(
            hex!("12 34 01 00 00 01 00 00 00 00 00 01 ff"),
            message.serialize().as_slice()
        );
    }

    #[test]
    fn test_round_trip() {
        let message = DnsMessage::new(7, 0x0120, 1, 2, 3, 4, b"opaque".to_vec());
        assert_eq!(message, DnsMessage::deserialize(&message.serialize()).unwrap());
    }

    #[test]
    fn test_is_valid() {
        assert!(!DnsMessage::new(1, 0, 0, 0, 0, 0, vec![]).is_valid());
        assert!(DnsMessage::new(1, 0, 0, 0, 0, 1, vec![]).is_valid());
        assert!(DnsMessage::new(1, 0, 0, 0, 1, 0, vec![]).is_valid());
        assert!(DnsMessage::new(1, 0, 0, 1, 0, 0, vec![]).is_valid());
        assert!(DnsMessage::new(1, 0, 1, 0, 0, 0, vec![]).is_valid());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = DnsMessage::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = DnsMessage::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("DnsMessage"), SIZE, SIZE - 1),
            err
        );
    }
}
