//! Byte-level protocol codecs spanning link to application layer.
//!
//! The following formats are supported:
//! - `Ethernet II` frames with a `CRC32` trailer
//! - `ARP` and `NDP` address resolution messages
//! - `ICMP`
//! - `IPv4`
//! - `IPv6`
//! - `TCP`
//! - `UDP`
//! - `TLS` record headers (1.2 and 1.3 share one framing)
//! - `DNS` message headers
//! - `FTP` command lines, `HTTP` messages and `SSH` version exchange lines
//!
//! Every codec is an owned value with the same four operations: a constructor
//! which normalizes its input, `serialize`, a fallible `deserialize` and a
//! cheap structural `is_valid` check. Codecs are independent of one another;
//! nothing here chains `Ethernet` to `IPv4` to `TCP` automatically. Transport
//! checksums take the enclosing network addresses from the caller.
//!
//! # Endianness
//!
//! All multi-byte wire fields are in network byte order (big-endian). Values
//! held in the codec structs are in host byte order.
//!
//! # Example
//!
//! The following example decodes a `UDP` datagram and verifies its checksum:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use netlevel_packet::udp::UdpDatagram;
//! use std::net::Ipv4Addr;
//!
//! let src = Ipv4Addr::new(10, 0, 0, 1);
//! let dst = Ipv4Addr::new(10, 0, 0, 2);
//! let datagram = UdpDatagram::new(5353, 53, b"query".to_vec());
//! let bytes = datagram.serialize(src, dst);
//! let decoded = UdpDatagram::deserialize(&bytes)?;
//! assert_eq!(5353, decoded.source_port);
//! assert_eq!(13, decoded.length);
//! assert!(decoded.validate_checksum(src, dst));
//! # Ok(())
//! # }
//! ```
//!
//! The following example builds an `ICMP` echo request:
//!
//! ```rust
//! use netlevel_packet::icmp::IcmpPacket;
//!
//! let icmp = IcmpPacket::echo_request(1234, 10, Vec::new());
//! assert_eq!(
//!     icmp.serialize(),
//!     hex_literal::hex!("08 00 f3 23 04 d2 00 0a")
//! );
//! ```
#![forbid(unsafe_code)]

use crate::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod buffer;

/// Packet errors.
pub mod error;

/// Functions for calculating network checksums.
pub mod checksum;

/// `Ethernet II` frames.
pub mod ethernet;

/// `ARP` packets.
pub mod arp;

/// `NDP` packets.
pub mod ndp;

/// `ICMP` packets.
pub mod icmp;

/// `IPv4` packets.
pub mod ipv4;

/// `IPv6` packets.
pub mod ipv6;

/// `TCP` segments.
pub mod tcp;

/// `UDP` datagrams.
pub mod udp;

/// `TLS` records.
pub mod tls;

/// `DNS` messages.
pub mod dns;

/// `FTP` command lines.
pub mod ftp;

/// `HTTP` messages.
pub mod http;

/// `SSH` version exchange lines.
pub mod ssh;

/// The IP packet next layer protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    IcmpV6,
    Udp,
    Tcp,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::IcmpV6 => 58,
            Self::Udp => 17,
            Self::Tcp => 6,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            58 => Self::IcmpV6,
            17 => Self::Udp,
            6 => Self::Tcp,
            p => Self::Other(p),
        }
    }
}

/// A 48-bit IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: Self = Self([0xFF; 6]);
    pub const UNSPECIFIED: Self = Self([0x00; 6]);

    #[must_use]
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self([a, b, c, d, e, f])
    }

    #[must_use]
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl Display for MacAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use itertools::Itertools as _;
        write!(f, "{:02x}", self.0.iter().format(":"))
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || Error::invalid_format("MacAddr", "expected six colon separated hex octets");
        let mut octets = [0_u8; 6];
        let mut parts = s.split([':', '-']);
        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

/// Format a payload as a hexadecimal string.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}
