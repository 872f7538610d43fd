use crate::buffer::Buffer;
use crate::checksum::{internet_checksum_with_pseudo_header, tcp_ipv4_checksum};
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use bitflags::bitflags;
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const SOURCE_PORT_OFFSET: usize = 0;
const DESTINATION_PORT_OFFSET: usize = 2;
const SEQUENCE_OFFSET: usize = 4;
const ACKNOWLEDGEMENT_OFFSET: usize = 8;
const DATA_OFFSET_AND_FLAGS_OFFSET: usize = 12;
const WINDOW_SIZE_OFFSET: usize = 14;
const CHECKSUM_OFFSET: usize = 16;
const URGENT_POINTER_OFFSET: usize = 18;
const OPTIONS_OFFSET: usize = 20;

/// The maximum size of the `TCP` options area.
pub const MAX_OPTIONS_SIZE: usize = 40;

bitflags! {
    /// The nine `TCP` control bits.
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
    pub struct TcpFlags: u16 {
        const FIN = 0x001;
        const SYN = 0x002;
        const RST = 0x004;
        const PSH = 0x008;
        const ACK = 0x010;
        const URG = 0x020;
        const ECE = 0x040;
        const CWR = 0x080;
        const NS = 0x100;
    }
}

/// Represents a `TCP` segment.
///
/// `data_offset` is the header length in 32-bit words. The checksum covers
/// an `IPv4` pseudo-header, so the enclosing addresses must be supplied to
/// `serialize`, `checksum` and `validate_checksum`.
#[derive(Clone, Eq, PartialEq)]
pub struct TcpSegment {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub acknowledgement: u32,
    pub data_offset: u8,
    pub reserved: u8,
    pub flags: TcpFlags,
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: Vec<u8>,
    pub data: Vec<u8>,
}

impl TcpSegment {
    /// Create a `TCP` segment without options.
    ///
    /// The checksum is left as zero until `serialize` or `checksum` is called
    /// with the enclosing addresses.
    #[must_use]
    pub const fn new(
        source_port: u16,
        destination_port: u16,
        sequence: u32,
        acknowledgement: u32,
        flags: TcpFlags,
        window_size: u16,
        data: Vec<u8>,
    ) -> Self {
        Self {
            source_port,
            destination_port,
            sequence,
            acknowledgement,
            data_offset: 5,
            reserved: 0,
            flags,
            window_size,
            checksum: 0,
            urgent_pointer: 0,
            options: Vec::new(),
            data,
        }
    }

    /// Replace the options area.
    ///
    /// Options are zero padded to a multiple of 4 bytes and truncated to 40
    /// bytes; the data offset follows the options length.
    #[must_use]
    pub fn with_options(mut self, mut options: Vec<u8>) -> Self {
        if options.len() > MAX_OPTIONS_SIZE {
            tracing::debug!(
                provided = options.len(),
                max = MAX_OPTIONS_SIZE,
                "truncating tcp options"
            );
            options.truncate(MAX_OPTIONS_SIZE);
        }
        options.resize(options.len().next_multiple_of(4), 0);
        self.data_offset = 5 + (options.len() / 4) as u8;
        self.options = options;
        self
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    /// The header size in bytes, including options.
    #[must_use]
    pub fn header_size(&self) -> usize {
        header_size(self.data_offset)
    }

    /// Serialize the segment, computing the checksum over the `IPv4`
    /// pseudo-header, the header and the data.
    #[must_use]
    pub fn serialize(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> Vec<u8> {
        let mut bytes = self.serialize_with(0);
        let length = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        let checksum = internet_checksum_with_pseudo_header(
            &bytes,
            src_addr,
            dest_addr,
            IpProtocol::Tcp,
            length,
        );
        Buffer::Mutable(&mut bytes).set_u16(CHECKSUM_OFFSET, checksum);
        bytes
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < Self::minimum_packet_size() {
            return Err(Error::too_short(
                "TcpSegment",
                Self::minimum_packet_size(),
                data.len(),
            ));
        }
        let buf = Buffer::Immutable(data);
        let offset_and_flags = buf.get_u16(DATA_OFFSET_AND_FLAGS_OFFSET);
        let data_offset = (offset_and_flags >> 12) as u8;
        let header_size = header_size(data_offset);
        if data.len() < header_size {
            return Err(Error::too_short("TcpSegment", header_size, data.len()));
        }
        Ok(Self {
            source_port: buf.get_u16(SOURCE_PORT_OFFSET),
            destination_port: buf.get_u16(DESTINATION_PORT_OFFSET),
            sequence: buf.get_u32(SEQUENCE_OFFSET),
            acknowledgement: buf.get_u32(ACKNOWLEDGEMENT_OFFSET),
            data_offset,
            reserved: ((offset_and_flags >> 9) & 0x7) as u8,
            flags: TcpFlags::from_bits_retain(offset_and_flags & 0x1ff),
            window_size: buf.get_u16(WINDOW_SIZE_OFFSET),
            checksum: buf.get_u16(CHECKSUM_OFFSET),
            urgent_pointer: buf.get_u16(URGENT_POINTER_OFFSET),
            options: data[OPTIONS_OFFSET..header_size].to_vec(),
            data: data[header_size..].to_vec(),
        })
    }

    /// The checksum this segment should carry between the given addresses.
    #[must_use]
    pub fn checksum(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
        tcp_ipv4_checksum(&self.serialize_with(self.checksum), src_addr, dest_addr)
    }

    #[must_use]
    pub fn validate_checksum(&self, src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> bool {
        self.checksum(src_addr, dest_addr) == self.checksum
    }

    /// Are both ports non-zero?
    ///
    /// Anything stronger depends on connection state.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.source_port != 0 && self.destination_port != 0
    }

    fn serialize_with(&self, checksum: u16) -> Vec<u8> {
        let header_size = self.header_size();
        let options_len = self.options.len().min(header_size - OPTIONS_OFFSET);
        let mut bytes = vec![0_u8; header_size + self.data.len()];
        let mut buf = Buffer::Mutable(&mut bytes);
        buf.set_u16(SOURCE_PORT_OFFSET, self.source_port);
        buf.set_u16(DESTINATION_PORT_OFFSET, self.destination_port);
        buf.set_u32(SEQUENCE_OFFSET, self.sequence);
        buf.set_u32(ACKNOWLEDGEMENT_OFFSET, self.acknowledgement);
        buf.set_u16(
            DATA_OFFSET_AND_FLAGS_OFFSET,
            (u16::from(self.data_offset & 0xf) << 12)
                | (u16::from(self.reserved & 0x7) << 9)
                | (self.flags.bits() & 0x1ff),
        );
        buf.set_u16(WINDOW_SIZE_OFFSET, self.window_size);
        buf.set_u16(CHECKSUM_OFFSET, checksum);
        buf.set_u16(URGENT_POINTER_OFFSET, self.urgent_pointer);
        buf.set_slice(OPTIONS_OFFSET, &self.options[..options_len]);
        buf.set_slice(header_size, &self.data);
        bytes
    }
}

fn header_size(data_offset: u8) -> usize {
    (usize::from(data_offset & 0xf) * 4).max(TcpSegment::minimum_packet_size())
}

impl Debug for TcpSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSegment")
            .field("source_port", &self.source_port)
            .field("destination_port", &self.destination_port)
            .field("sequence", &self.sequence)
            .field("acknowledgement", &self.acknowledgement)
            .field("data_offset", &self.data_offset)
            .field("reserved", &self.reserved)
            .field("flags", &self.flags)
            .field("window_size", &self.window_size)
            .field("checksum", &self.checksum)
            .field("urgent_pointer", &self.urgent_pointer)
            .field("options", &fmt_payload(&self.options))
            .field("data", &fmt_payload(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    const SRC_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 103);
    const DEST_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    #[test_case(TcpFlags::FIN, hex!("50 01"); "fin")]
    #[test_case(TcpFlags::SYN | TcpFlags::ACK, hex!("50 12"); "syn ack")]
    #[test_case(TcpFlags::PSH | TcpFlags::ACK, hex!("50 18"); "psh ack")]
    #[test_case(TcpFlags::RST, hex!("50 04"); "rst")]
    #[test_case(TcpFlags::URG | TcpFlags::ECE | TcpFlags::CWR, hex!("50 e0"); "urg ece cwr")]
    #[test_case(TcpFlags::NS, hex!("51 00"); "ns")]
    #[test_case(TcpFlags::all(), hex!("51 ff"); "all")]
    fn test_flags(flags: TcpFlags, expected: [u8; 2]) {
        let segment = TcpSegment::new(1, 2, 0, 0, flags, 0, vec![]);
        assert_eq!(expected, segment.serialize(SRC_ADDR, DEST_ADDR)[12..14]);
    }

    #[test]
    fn test_serialize() {
        let segment = TcpSegment::new(
            80,
            33002,
            0,
            0x959d_2ec7,
            TcpFlags::SYN | TcpFlags::ACK,
            0xffff,
            vec![],
        );
        assert_eq!(
            hex!("00 50 80 ea 00 00 00 00 95 9d 2e c7 50 12 ff ff 55 cc 00 00"),
            segment.serialize(SRC_ADDR, DEST_ADDR).as_slice()
        );
        assert_eq!(0x55cc, segment.checksum(SRC_ADDR, DEST_ADDR));
    }

    #[test]
    fn test_validate_checksum() {
        let buf = hex!("00 50 80 ea 00 00 00 00 95 9d 2e c7 50 12 ff ff 55 cc 00 00");
        let segment = TcpSegment::deserialize(&buf).unwrap();
        assert!(segment.validate_checksum(SRC_ADDR, DEST_ADDR));
        assert!(!segment.validate_checksum(SRC_ADDR, Ipv4Addr::new(10, 0, 0, 2)));
    }

    #[test]
    fn test_view() {
        let buf = hex!(
            "01 bb e5 d7 60 b0 76 50 8e 03 46 a2 80 10 00 80 3e dc 00 00"
            "01 01 08 0a 10 52 f6 d4 ea 3a 2a 51"
        );
        let segment = TcpSegment::deserialize(&buf).unwrap();
        assert_eq!(443, segment.source_port);
        assert_eq!(58839, segment.destination_port);
        assert_eq!(1_622_177_360, segment.sequence);
        assert_eq!(2_382_579_362, segment.acknowledgement);
        assert_eq!(8, segment.data_offset);
        assert_eq!(32, segment.header_size());
        assert_eq!(0, segment.reserved);
        assert_eq!(TcpFlags::ACK, segment.flags);
        assert_eq!(128, segment.window_size);
        assert_eq!(0x3edc, segment.checksum);
        assert_eq!(0, segment.urgent_pointer);
        assert_eq!(
            hex!("01 01 08 0a 10 52 f6 d4 ea 3a 2a 51"),
            segment.options.as_slice()
        );
        assert!(segment.data.is_empty());
        assert!(segment.is_valid());
    }

    #[test]
    fn test_with_options() {
        let segment = TcpSegment::new(1234, 443, 1, 0, TcpFlags::SYN, 64240, vec![])
            .with_options(vec![0x02, 0x04, 0x05, 0xb4, 0x01, 0x03, 0x03]);
        assert_eq!(7, segment.data_offset);
        assert_eq!(8, segment.options.len());
        let bytes = segment.serialize(SRC_ADDR, DEST_ADDR);
        assert_eq!(28, bytes.len());
        assert_eq!(0x70, bytes[12] & 0xf0);
        assert_eq!(hex!("02 04 05 b4 01 03 03 00"), bytes[20..28]);
    }

    #[test]
    fn test_with_options_truncated() {
        let segment =
            TcpSegment::new(1, 2, 0, 0, TcpFlags::empty(), 0, vec![]).with_options(vec![1; 41]);
        assert_eq!(15, segment.data_offset);
        assert_eq!(60, segment.header_size());
        assert_eq!(MAX_OPTIONS_SIZE, segment.options.len());
    }

    #[test]
    fn test_round_trip() {
        let mut segment = TcpSegment::new(
            49152,
            22,
            0xdead_beef,
            0x0102_0304,
            TcpFlags::PSH | TcpFlags::ACK,
            501,
            b"SSH-2.0-OpenSSH_9.6\r\n".to_vec(),
        )
        .with_options(vec![0x01, 0x01, 0x08, 0x0a, 0, 0, 0, 1, 0, 0, 0, 2]);
        segment.checksum = segment.checksum(SRC_ADDR, DEST_ADDR);
        let decoded = TcpSegment::deserialize(&segment.serialize(SRC_ADDR, DEST_ADDR)).unwrap();
        assert_eq!(segment, decoded);
        assert!(decoded.validate_checksum(SRC_ADDR, DEST_ADDR));
    }

    #[test_case(80, 1234, true; "both ports")]
    #[test_case(0, 1234, false; "zero source port")]
    #[test_case(80, 0, false; "zero destination port")]
    fn test_is_valid(source_port: u16, destination_port: u16, expected: bool) {
        let segment =
            TcpSegment::new(source_port, destination_port, 0, 0, TcpFlags::SYN, 0, vec![]);
        assert_eq!(expected, segment.is_valid());
    }

    #[test]
    fn test_deserialize_insufficient_buffer() {
        const SIZE: usize = TcpSegment::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = TcpSegment::deserialize(&buf).unwrap_err();
        assert_eq!(
            Error::TooShort(String::from("TcpSegment"), SIZE, SIZE - 1),
            err
        );
    }

    #[test]
    fn test_deserialize_insufficient_buffer_for_options() {
        let mut buf = [0_u8; 31];
        buf[12] = 0x80;
        let err = TcpSegment::deserialize(&buf).unwrap_err();
        assert_eq!(Error::TooShort(String::from("TcpSegment"), 32, 31), err);
    }
}
