//! Checksum implementations for the link, network and transport codecs.
//!
//! Two independent algorithms are provided:
//!
//! - the table driven IEEE 802.3 `CRC32` used as the Ethernet frame trailer
//! - the RFC 1071 Internet checksum used by `ICMP`, `IPv4`, `TCP` and `UDP`,
//!   optionally covering an `IPv4` or `IPv6` pseudo-header
//!
//! The per-protocol helpers (`ipv4_header_checksum`, `tcp_ipv4_checksum`, ...)
//! skip the checksum word of the packet they are given, so the same call both
//! computes the value to store and verifies a value already stored.

use crate::IpProtocol;
use std::net::{Ipv4Addr, Ipv6Addr};

/// The reflected IEEE 802.3 `CRC32` polynomial.
pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// The `CRC32` lookup table, derived at compile time and never mutated.
static CRC32_TABLE: [u32; 256] = crc32_table();

const fn crc32_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC32_POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Calculate the IEEE 802.3 `CRC32` of `data`.
#[must_use]
pub fn crc32_ieee(data: &[u8]) -> u32 {
    !data.iter().fold(0xFFFF_FFFF_u32, |crc, &b| {
        CRC32_TABLE[usize::from((crc as u8) ^ b)] ^ (crc >> 8)
    })
}

/// Calculate the RFC 1071 Internet checksum of `data`.
#[must_use]
pub fn internet_checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data, None))
}

/// Calculate the Internet checksum of a transport segment including the
/// 12-byte `IPv4` pseudo-header.
///
/// The pseudo-header is the source address, destination address, a zero
/// byte, the protocol number and the segment `length`.
#[must_use]
pub fn internet_checksum_with_pseudo_header(
    segment: &[u8],
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    protocol: IpProtocol,
    length: u16,
) -> u16 {
    let sum = ipv4_pseudo_header_sum(src_addr, dest_addr, protocol, u32::from(length))
        + sum_be_words(segment, None);
    finalize_checksum(sum)
}

/// Calculate the Internet checksum of an upper layer packet including the
/// 40-byte `IPv6` pseudo-header.
#[must_use]
pub fn internet_checksum_with_ipv6_pseudo_header(
    data: &[u8],
    src_addr: Ipv6Addr,
    dest_addr: Ipv6Addr,
    next_header: IpProtocol,
    length: u32,
) -> u16 {
    let sum = ipv6_pseudo_header_sum(src_addr, dest_addr, next_header, length)
        + sum_be_words(data, None);
    finalize_checksum(sum)
}

/// Calculate the checksum for an `IPv4` header.
#[must_use]
pub fn ipv4_header_checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data, Some(5)))
}

/// Calculate the checksum for an `ICMP` packet.
#[must_use]
pub fn icmp_checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data, Some(1)))
}

/// Calculate the checksum for an `IPv4` `UDP` datagram.
#[must_use]
pub fn udp_ipv4_checksum(data: &[u8], src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
    ipv4_checksum(data, 3, src_addr, dest_addr, IpProtocol::Udp)
}

/// Calculate the checksum for an `IPv4` `TCP` segment.
#[must_use]
pub fn tcp_ipv4_checksum(data: &[u8], src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
    ipv4_checksum(data, 8, src_addr, dest_addr, IpProtocol::Tcp)
}

/// Calculate the checksum for an `ICMPv6` packet, such as an `NDP` message.
#[must_use]
pub fn icmpv6_checksum(data: &[u8], src_addr: Ipv6Addr, dest_addr: Ipv6Addr) -> u16 {
    let sum = ipv6_pseudo_header_sum(src_addr, dest_addr, IpProtocol::IcmpV6, data.len() as u32)
        + sum_be_words(data, Some(1));
    finalize_checksum(sum)
}

fn ipv4_checksum(
    data: &[u8],
    ignore_word: usize,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    next_level_protocol: IpProtocol,
) -> u16 {
    let sum = ipv4_pseudo_header_sum(source, destination, next_level_protocol, data.len() as u32)
        + sum_be_words(data, Some(ignore_word));
    finalize_checksum(sum)
}

fn ipv4_pseudo_header_sum(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: IpProtocol,
    length: u32,
) -> u64 {
    ipv4_word_sum(source)
        + ipv4_word_sum(destination)
        + u64::from(protocol.id())
        + u64::from(length)
}

fn ipv4_word_sum(ip: Ipv4Addr) -> u64 {
    let octets = ip.octets();
    u64::from(u16::from_be_bytes([octets[0], octets[1]]))
        + u64::from(u16::from_be_bytes([octets[2], octets[3]]))
}

fn ipv6_pseudo_header_sum(
    source: Ipv6Addr,
    destination: Ipv6Addr,
    next_header: IpProtocol,
    length: u32,
) -> u64 {
    ipv6_word_sum(source)
        + ipv6_word_sum(destination)
        + u64::from(length >> 16)
        + u64::from(length & 0xFFFF)
        + u64::from(next_header.id())
}

fn ipv6_word_sum(ip: Ipv6Addr) -> u64 {
    ip.segments().iter().map(|x| u64::from(*x)).sum()
}

/// Sum the big-endian 16-bit words of `data`, skipping the word at index
/// `ignore_word` if given.
///
/// A trailing odd byte is treated as the high byte of a zero padded word.
fn sum_be_words(data: &[u8], ignore_word: Option<usize>) -> u64 {
    let mut words = data.chunks_exact(2);
    let mut sum = words
        .by_ref()
        .enumerate()
        .filter(|(i, _)| Some(*i) != ignore_word)
        .map(|(_, word)| u64::from(u16::from_be_bytes([word[0], word[1]])))
        .sum::<u64>();
    if let [last] = words.remainder() {
        if Some(data.len() / 2) != ignore_word {
            sum += u64::from(*last) << 8;
        }
    }
    sum
}

const fn finalize_checksum(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}
