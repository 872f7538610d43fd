use anyhow::{anyhow, Context};
use clap::ValueEnum;
use file::ConfigFile;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// The protocol to decode a packet as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolConfig {
    /// Ethernet II frame with a CRC32 trailer
    Ethernet,
    /// Address Resolution Protocol
    Arp,
    /// Neighbor Discovery Protocol
    Ndp,
    /// Internet Control Message Protocol
    Icmp,
    /// Internet Protocol version 4
    Ipv4,
    /// Internet Protocol version 6
    Ipv6,
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
    /// TLS record
    Tls,
    /// DNS message header
    Dns,
    /// FTP command line
    Ftp,
    /// HTTP message
    Http,
    /// SSH identification line
    Ssh,
}

impl ProtocolConfig {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethernet => "ethernet",
            Self::Arp => "arp",
            Self::Ndp => "ndp",
            Self::Icmp => "icmp",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Tls => "tls",
            Self::Dns => "dns",
            Self::Ftp => "ftp",
            Self::Http => "http",
            Self::Ssh => "ssh",
        }
    }
}

impl Display for ProtocolConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The output mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Print a table of the decoded fields.
    Pretty,
    /// Print a json report of the decoded fields.
    Json,
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The addresses of the enclosing IP packet, used to verify transport checksums.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChecksumAddrs {
    Ipv4(Ipv4Addr, Ipv4Addr),
    Ipv6(Ipv6Addr, Ipv6Addr),
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum NetlevelAction {
    /// Decode a packet.
    Decode(NetlevelConfig),
    /// Print a template toml config file and exit.
    PrintConfigTemplate,
}

impl NetlevelAction {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        Ok(if args.print_config_template {
            Self::PrintConfigTemplate
        } else {
            Self::Decode(NetlevelConfig::from(args)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct NetlevelConfig {
    pub protocol: ProtocolConfig,
    pub packet: Vec<u8>,
    pub mode: Mode,
    pub checksum_addrs: Option<ChecksumAddrs>,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl NetlevelConfig {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        let input = match &args.packet {
            Some(packet) => packet.clone(),
            None => std::io::read_to_string(std::io::stdin())
                .context("failed to read packet from stdin")?,
        };
        Self::build_config(args, cfg_file, &input)
    }

    fn build_config(args: Args, cfg_file: ConfigFile, input: &str) -> anyhow::Result<Self> {
        let cfg_file_netlevel = cfg_file.netlevel.unwrap_or_default();
        let cfg_file_checksum = cfg_file.checksum.unwrap_or_default();
        let protocol = cfg_layer(
            args.protocol,
            cfg_file_netlevel.protocol,
            constants::DEFAULT_PROTOCOL,
        );
        let mode = cfg_layer(args.mode, cfg_file_netlevel.mode, constants::DEFAULT_MODE);
        let source_addr = cfg_layer_opt(args.source_address, cfg_file_checksum.source_address);
        let destination_addr = cfg_layer_opt(
            args.destination_address,
            cfg_file_checksum.destination_address,
        );
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_netlevel.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_netlevel.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_netlevel.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        let checksum_addrs = validate_checksum_addrs(protocol, source_addr, destination_addr)?;
        let packet = parse_packet(input)?;
        Ok(Self {
            protocol,
            packet,
            mode,
            checksum_addrs,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for NetlevelConfig {
    fn default() -> Self {
        Self {
            protocol: constants::DEFAULT_PROTOCOL,
            packet: vec![],
            mode: constants::DEFAULT_MODE,
            checksum_addrs: None,
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

/// Parse a hex encoded packet, ignoring whitespace and `:` separators.
fn parse_packet(input: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if digits.is_empty() {
        return Err(anyhow!("no packet provided"));
    }
    hex::decode(&digits).context("packet is not valid hex")
}

/// Validate the checksum addresses against the protocol.
///
/// Addresses are only used by the `tcp`, `udp` and `ndp` checksums and are
/// ignored for every other protocol.
fn validate_checksum_addrs(
    protocol: ProtocolConfig,
    source_addr: Option<IpAddr>,
    destination_addr: Option<IpAddr>,
) -> anyhow::Result<Option<ChecksumAddrs>> {
    match (source_addr, destination_addr) {
        (None, None) => Ok(None),
        (Some(_), None) | (None, Some(_)) => Err(anyhow!(
            "source-address and destination-address must be provided together"
        )),
        (Some(src), Some(dest)) => match (protocol, src, dest) {
            (ProtocolConfig::Tcp | ProtocolConfig::Udp, IpAddr::V4(src), IpAddr::V4(dest)) => {
                Ok(Some(ChecksumAddrs::Ipv4(src, dest)))
            }
            (ProtocolConfig::Ndp, IpAddr::V6(src), IpAddr::V6(dest)) => {
                Ok(Some(ChecksumAddrs::Ipv6(src, dest)))
            }
            (ProtocolConfig::Tcp | ProtocolConfig::Udp, _, _) => Err(anyhow!(
                "{protocol} checksums require IPv4 source and destination addresses"
            )),
            (ProtocolConfig::Ndp, _, _) => Err(anyhow!(
                "ndp checksums require IPv6 source and destination addresses"
            )),
            _ => Ok(None),
        },
    }
}
