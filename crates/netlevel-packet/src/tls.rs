use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

const CONTENT_TYPE_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 1;
const LENGTH_OFFSET: usize = 3;
const PAYLOAD_OFFSET: usize = 5;

/// The record layer version carried by both `TLS` 1.2 and `TLS` 1.3 records.
///
/// `TLS` 1.3 freezes the record version at the 1.2 value, so one codec
/// frames both.
pub const TLS_LEGACY_RECORD_VERSION: u16 = 0x0303;

/// The `TLS` record content type.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Other(u8),
}

impl ContentType {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::ChangeCipherSpec => 20,
            Self::Alert => 21,
            Self::Handshake => 22,
            Self::ApplicationData => 23,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for ContentType {
    fn from(id: u8) -> Self {
        match id {
            20 => Self::ChangeCipherSpec,
            21 => Self::Alert,
            22 => Self::Handshake,
            23 => Self::ApplicationData,
            id => Self::Other(id),
        }
    }
}

/// Represents a `TLS` record header and its opaque payload.
#[derive(Clone, Eq, PartialEq)]
pub struct TlsRecord {
    pub content_type: ContentType,
    pub version: u16,
    pub length: u16,
    pub payload: Vec<u8>,
}

impl TlsRecord {
    #[must_use]
    pub fn new(content_type: ContentType, payload: Vec<u8>) -> Self {
        Self {
            content_type,
            version: TLS_LEGACY_RECORD_VERSION,
            length: u16::try_from(payload.len()).unwrap_or(u16::MAX),
            payload,
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        5
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; Self::minimum_packet_size() + self.payload.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        *buf.write(CONTENT_TYPE_OFFSET) = self.content_type.id();
        buf.set_u16(VERSION_OFFSET, self.version);
        buf.set_u16(LENGTH_OFFSET, self.length);
        buf.set_slice(PAYLOAD_OFFSET, &self.payload);
        bytes
    }

    /// Decode a record; everything after the header is payload, whatever the
    /// declared length.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "TlsRecord",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        Ok(Self {
            content_type: ContentType::from(buf.read(CONTENT_TYPE_OFFSET)),
            version: buf.get_u16(VERSION_OFFSET),
            length: buf.get_u16(LENGTH_OFFSET),
            payload: data[PAYLOAD_OFFSET..].to_vec(),
        })
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.version == TLS_LEGACY_RECORD_VERSION && usize::from(self.length) == self.payload.len()
    }
}

impl Debug for TlsRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsRecord")
            .field("content_type", &self.content_type)
            .field("version", &self.version)
            .field("length", &self.length)
            .field("payload", &fmt_payload(&self.payload))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test_case(20, ContentType::ChangeCipherSpec; "change cipher spec")]
    #[test_case(21, ContentType::Alert; "alert")]
    #[test_case(22, ContentType::Handshake; "handshake")]
    #[test_case(23, ContentType::ApplicationData; "application data")]
    #[test_case(24, ContentType::Other(24); "heartbeat")]
    fn test_content_type(id: u8, expected: ContentType) {
        assert_eq!(expected, ContentType::from(id));
        assert_eq!(id, expected.id());
    }

    #[test]
    fn test_serialize() {
        let record = TlsRecord::new(ContentType::Alert, vec![0x02, 0x28]);
        assert_eq!(hex!("15 03 03 00 02 02 28"), record.serialize().as_slice());
        assert!(record.is_valid());
    }

    #[test]
    fn test_view() {
        let buf = hex!("17 03 03 00 04 de ad be ef");
        let record = TlsRecord::deserialize(&buf).unwrap();
        assert_eq!(ContentType::ApplicationData, record.content_type);
        assert_eq!(TLS_LEGACY_RECORD_VERSION, record.version);
        assert_eq!(4, record.length);
        assert_eq!(hex!("de ad be ef"), record.payload.as_slice());
        assert!(record.is_valid());
    }

    #[test]
    fn test_round_trip() {
        let record = TlsRecord::new(ContentType::Handshake, b"client hello".to_vec());
        assert_eq!(record, TlsRecord::deserialize(&record.serialize()).unwrap());
    }

    #[test]
    fn test_is_valid() {
        let buf = hex!("16 03 01 00 01 01");
        assert!(!TlsRecord::deserialize(&buf).unwrap().is_valid());
        let buf = hex!("16 03 03 00 08 01");
        assert!(!TlsRecord::deserialize(&buf).unwrap().is_valid());
        let buf = hex!("16 03 03 00 00");
        assert!(TlsRecord::deserialize(&buf).unwrap().is_valid());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = TlsRecord::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = TlsRecord::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("TlsRecord"), SIZE, SIZE - 1),
            err
        );
    }
}
