use crate::config::{LogFormat, LogSpanEvents, Mode, ProtocolConfig};
use clap::Parser;
use std::net::IpAddr;

/// Decode and check a single network packet
#[derive(Parser, Debug)]
#[command(name = "netlevel", author, version, about, long_about = None)]
pub struct Args {
    /// The packet as hex, whitespace and `:` separators are ignored [default: read from stdin]
    pub packet: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// The protocol to decode the packet as [default: ethernet]
    #[arg(value_enum, short = 'p', long)]
    pub protocol: Option<ProtocolConfig>,

    /// Output mode [default: pretty]
    #[arg(value_enum, short = 'm', long)]
    pub mode: Option<Mode>,

    /// The source address used to verify tcp, udp and ndp checksums
    #[arg(long)]
    pub source_address: Option<IpAddr>,

    /// The destination address used to verify tcp, udp and ndp checksums
    #[arg(long)]
    pub destination_address: Option<IpAddr>,

    /// Print a template toml config file and exit
    #[arg(long)]
    pub print_config_template: bool,

    /// The debug log format [default: pretty]
    #[arg(value_enum, long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: netlevel=debug,netlevel_packet=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log span events [default: off]
    #[arg(value_enum, long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}
