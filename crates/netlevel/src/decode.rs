use crate::config::{ChecksumAddrs, ProtocolConfig};
use crate::report::{ChecksumStatus, Report};
use anyhow::Context;
use itertools::Itertools;
use netlevel_packet::arp::ArpPacket;
use netlevel_packet::dns::DnsMessage;
use netlevel_packet::ethernet::EthernetFrame;
use netlevel_packet::fmt_payload;
use netlevel_packet::ftp::FtpLine;
use netlevel_packet::http::HttpMessage;
use netlevel_packet::icmp::IcmpPacket;
use netlevel_packet::ipv4::Ipv4Packet;
use netlevel_packet::ipv6::Ipv6Packet;
use netlevel_packet::ndp::NdpPacket;
use netlevel_packet::ssh::SshLine;
use netlevel_packet::tcp::TcpSegment;
use netlevel_packet::tls::TlsRecord;
use netlevel_packet::udp::UdpDatagram;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::instrument;

/// Decode `bytes` as a `protocol` packet and check it.
///
/// Transport checksums are only verified when `addrs` holds addresses of the
/// family the protocol needs, otherwise they are reported as unchecked.
#[instrument(skip_all, fields(%protocol, len = bytes.len()), level = "trace")]
pub fn decode(
    protocol: ProtocolConfig,
    bytes: &[u8],
    addrs: Option<ChecksumAddrs>,
) -> anyhow::Result<Report> {
    let report = match protocol {
        ProtocolConfig::Ethernet => ethernet(bytes),
        ProtocolConfig::Arp => arp(bytes),
        ProtocolConfig::Ndp => ndp(bytes, ipv6_addrs(addrs)),
        ProtocolConfig::Icmp => icmp(bytes),
        ProtocolConfig::Ipv4 => ipv4(bytes),
        ProtocolConfig::Ipv6 => ipv6(bytes),
        ProtocolConfig::Tcp => tcp(bytes, ipv4_addrs(addrs)),
        ProtocolConfig::Udp => udp(bytes, ipv4_addrs(addrs)),
        ProtocolConfig::Tls => tls(bytes),
        ProtocolConfig::Dns => dns(bytes),
        ProtocolConfig::Ftp => ftp(bytes),
        ProtocolConfig::Http => http(bytes),
        ProtocolConfig::Ssh => ssh(bytes),
    }
    .with_context(|| format!("failed to decode {protocol} packet"))?;
    tracing::debug!(valid = report.valid, checksum = %report.checksum, "decoded packet");
    Ok(report)
}

const fn ipv4_addrs(addrs: Option<ChecksumAddrs>) -> Option<(Ipv4Addr, Ipv4Addr)> {
    match addrs {
        Some(ChecksumAddrs::Ipv4(src, dest)) => Some((src, dest)),
        _ => None,
    }
}

const fn ipv6_addrs(addrs: Option<ChecksumAddrs>) -> Option<(Ipv6Addr, Ipv6Addr)> {
    match addrs {
        Some(ChecksumAddrs::Ipv6(src, dest)) => Some((src, dest)),
        _ => None,
    }
}

fn checked<A>(addrs: Option<A>, validate: impl FnOnce(A) -> bool) -> ChecksumStatus {
    addrs.map_or(ChecksumStatus::Unchecked, |addrs| {
        ChecksumStatus::from(validate(addrs))
    })
}

fn ethernet(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let frame = EthernetFrame::deserialize(bytes)?;
    let checksum = ChecksumStatus::from(frame.validate_crc());
    Ok(Report::new(ProtocolConfig::Ethernet, frame.is_valid(), checksum)
        .field("destination", frame.destination)
        .field("source", frame.source)
        .field(
            "ethertype",
            format!("{:?} (0x{:04x})", frame.ethertype, frame.ethertype.id()),
        )
        .field("payload_length", frame.payload.len())
        .field("payload", fmt_payload(&frame.payload))
        .field("crc", format!("0x{:08x}", frame.crc)))
}

fn arp(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let packet = ArpPacket::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Arp, packet.is_valid(), ChecksumStatus::Unchecked)
            .field("hardware_type", packet.hardware_type)
            .field("protocol_type", format!("0x{:04x}", packet.protocol_type))
            .field("hardware_addr_len", packet.hardware_addr_len)
            .field("protocol_addr_len", packet.protocol_addr_len)
            .field(
                "operation",
                format!("{:?} ({})", packet.operation, packet.operation.id()),
            )
            .field("sender_hardware_addr", packet.sender_hardware_addr)
            .field("sender_protocol_addr", packet.sender_protocol_addr)
            .field("target_hardware_addr", packet.target_hardware_addr)
            .field("target_protocol_addr", packet.target_protocol_addr),
    )
}

fn ndp(
    bytes: &[u8],
    addrs: Option<(Ipv6Addr, Ipv6Addr)>,
) -> netlevel_packet::error::Result<Report> {
    let packet = NdpPacket::deserialize(bytes)?;
    let checksum = checked(addrs, |(src, dest)| packet.validate_checksum(src, dest));
    Ok(Report::new(ProtocolConfig::Ndp, packet.is_valid(), checksum)
        .field(
            "ndp_type",
            format!("{:?} ({})", packet.ndp_type, packet.ndp_type.id()),
        )
        .field("code", packet.code)
        .field("checksum", format!("0x{:04x}", packet.checksum))
        .field("reserved", format!("0x{:08x}", packet.reserved))
        .field("target_address", packet.target_address)
        .field("options", fmt_payload(&packet.options)))
}

fn icmp(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let packet = IcmpPacket::deserialize(bytes)?;
    let checksum = ChecksumStatus::from(packet.validate_checksum());
    Ok(Report::new(ProtocolConfig::Icmp, packet.is_valid(), checksum)
        .field(
            "icmp_type",
            format!("{:?} ({})", packet.icmp_type, packet.icmp_type.id()),
        )
        .field("icmp_code", packet.icmp_code.0)
        .field("checksum", format!("0x{:04x}", packet.checksum))
        .field("identifier", packet.identifier)
        .field("sequence", packet.sequence)
        .field("data", fmt_payload(&packet.data)))
}

fn ipv4(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let packet = Ipv4Packet::deserialize(bytes)?;
    let checksum = ChecksumStatus::from(packet.validate_checksum());
    Ok(Report::new(ProtocolConfig::Ipv4, packet.is_valid(), checksum)
        .field("version", packet.version)
        .field("header_length", packet.header_length)
        .field("dscp", packet.dscp())
        .field("ecn", packet.ecn())
        .field("total_length", packet.total_length)
        .field("identification", packet.identification)
        .field("dont_fragment", packet.dont_fragment())
        .field("more_fragments", packet.more_fragments())
        .field("fragment_offset", packet.fragment_offset())
        .field("ttl", packet.ttl)
        .field(
            "protocol",
            format!("{:?} ({})", packet.protocol, packet.protocol.id()),
        )
        .field("checksum", format!("0x{:04x}", packet.checksum))
        .field("source", packet.source)
        .field("destination", packet.destination)
        .field("options", fmt_payload(&packet.options))
        .field("data", fmt_payload(&packet.data)))
}

fn ipv6(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let packet = Ipv6Packet::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Ipv6, packet.is_valid(), ChecksumStatus::Unchecked)
            .field("version", packet.version)
            .field("traffic_class", packet.traffic_class)
            .field("flow_label", packet.flow_label)
            .field("payload_length", packet.payload_length)
            .field(
                "next_header",
                format!("{:?} ({})", packet.next_header, packet.next_header.id()),
            )
            .field("hop_limit", packet.hop_limit)
            .field("source", packet.source)
            .field("destination", packet.destination)
            .field("data", fmt_payload(&packet.data)),
    )
}

fn tcp(
    bytes: &[u8],
    addrs: Option<(Ipv4Addr, Ipv4Addr)>,
) -> netlevel_packet::error::Result<Report> {
    let segment = TcpSegment::deserialize(bytes)?;
    let checksum = checked(addrs, |(src, dest)| segment.validate_checksum(src, dest));
    let flags = segment.flags.iter_names().map(|(name, _)| name).join("|");
    Ok(Report::new(ProtocolConfig::Tcp, segment.is_valid(), checksum)
        .field("source_port", segment.source_port)
        .field("destination_port", segment.destination_port)
        .field("sequence", segment.sequence)
        .field("acknowledgement", segment.acknowledgement)
        .field("data_offset", segment.data_offset)
        .field("flags", flags)
        .field("window_size", segment.window_size)
        .field("checksum", format!("0x{:04x}", segment.checksum))
        .field("urgent_pointer", segment.urgent_pointer)
        .field("options", fmt_payload(&segment.options))
        .field("data", fmt_payload(&segment.data)))
}

fn udp(
    bytes: &[u8],
    addrs: Option<(Ipv4Addr, Ipv4Addr)>,
) -> netlevel_packet::error::Result<Report> {
    let datagram = UdpDatagram::deserialize(bytes)?;
    let checksum = checked(addrs, |(src, dest)| datagram.validate_checksum(src, dest));
    Ok(Report::new(ProtocolConfig::Udp, datagram.is_valid(), checksum)
        .field("source_port", datagram.source_port)
        .field("destination_port", datagram.destination_port)
        .field("length", datagram.length)
        .field("checksum", format!("0x{:04x}", datagram.checksum))
        .field("data", fmt_payload(&datagram.data)))
}

fn tls(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let record = TlsRecord::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Tls, record.is_valid(), ChecksumStatus::Unchecked)
            .field(
                "content_type",
                format!("{:?} ({})", record.content_type, record.content_type.id()),
            )
            .field("version", format!("0x{:04x}", record.version))
            .field("length", record.length)
            .field("payload", fmt_payload(&record.payload)),
    )
}

fn dns(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let message = DnsMessage::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Dns, message.is_valid(), ChecksumStatus::Unchecked)
            .field("id", message.id)
            .field("flags", format!("0x{:04x}", message.flags))
            .field("is_response", message.is_response())
            .field("opcode", message.opcode())
            .field("rcode", message.rcode())
            .field("question_count", message.question_count)
            .field("answer_count", message.answer_count)
            .field("authority_count", message.authority_count)
            .field("additional_count", message.additional_count)
            .field("payload", fmt_payload(&message.payload)),
    )
}

fn ftp(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let line = FtpLine::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Ftp, line.is_valid(), ChecksumStatus::Unchecked)
            .field("command", &line.command)
            .field("arguments", &line.arguments),
    )
}

fn http(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let message = HttpMessage::deserialize(bytes)?;
    let report = Report::new(ProtocolConfig::Http, message.is_valid(), ChecksumStatus::Unchecked)
        .field("start_line", &message.start_line);
    Ok(message
        .headers
        .iter()
        .fold(report, |report, (name, value)| {
            report.field(&format!("header {name}"), value)
        })
        .field("body", String::from_utf8_lossy(&message.body)))
}

fn ssh(bytes: &[u8]) -> netlevel_packet::error::Result<Report> {
    let line = SshLine::deserialize(bytes)?;
    Ok(
        Report::new(ProtocolConfig::Ssh, line.is_valid(), ChecksumStatus::Unchecked)
            .field("protocol_version", &line.protocol_version)
            .field("software_version", &line.software_version)
            .field("payload", fmt_payload(&line.payload)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use netlevel_packet::tcp::TcpFlags;
    use test_case::test_case;

    const SRC_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const DEST_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
    const OTHER_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 3);

    #[test]
    fn test_icmp() {
        let report = decode(
            ProtocolConfig::Icmp,
            &hex!("08 00 f3 23 04 d2 00 0a"),
            None,
        )
        .unwrap();
        assert_eq!("icmp", report.protocol);
        assert!(report.valid);
        assert_eq!(ChecksumStatus::Ok, report.checksum);
        assert_eq!("EchoRequest (8)", report.fields["icmp_type"]);
        assert_eq!("1234", report.fields["identifier"]);
        assert_eq!("10", report.fields["sequence"]);
    }

    #[test]
    fn test_icmp_bad_checksum() {
        let report = decode(
            ProtocolConfig::Icmp,
            &hex!("08 00 f3 24 04 d2 00 0a"),
            None,
        )
        .unwrap();
        assert_eq!(ChecksumStatus::Bad, report.checksum);
    }

    #[test]
    fn test_ipv4() {
        let report = decode(
            ProtocolConfig::Ipv4,
            &hex!("45 00 00 14 00 00 00 00 40 06 f8 cb c0 a8 00 01 c0 a8 00 c7"),
            None,
        )
        .unwrap();
        assert_eq!(ChecksumStatus::Ok, report.checksum);
        assert_eq!("Tcp (6)", report.fields["protocol"]);
        assert_eq!("192.168.0.199", report.fields["destination"]);
    }

    #[test_case(Some(ChecksumAddrs::Ipv4(SRC_ADDR, DEST_ADDR)), ChecksumStatus::Ok; "matching addresses")]
    #[test_case(Some(ChecksumAddrs::Ipv4(SRC_ADDR, OTHER_ADDR)), ChecksumStatus::Bad; "wrong destination")]
    #[test_case(None, ChecksumStatus::Unchecked; "no addresses")]
    fn test_udp(addrs: Option<ChecksumAddrs>, expected: ChecksumStatus) {
        let bytes = UdpDatagram::new(5353, 53, b"query".to_vec()).serialize(SRC_ADDR, DEST_ADDR);
        let report = decode(ProtocolConfig::Udp, &bytes, addrs).unwrap();
        assert_eq!(expected, report.checksum);
        assert_eq!("13", report.fields["length"]);
    }

    #[test]
    fn test_tcp_flags() {
        let segment = TcpSegment::new(
            443,
            49152,
            1,
            1,
            TcpFlags::SYN | TcpFlags::ACK,
            1024,
            vec![],
        );
        let bytes = segment.serialize(SRC_ADDR, DEST_ADDR);
        let report = decode(
            ProtocolConfig::Tcp,
            &bytes,
            Some(ChecksumAddrs::Ipv4(SRC_ADDR, DEST_ADDR)),
        )
        .unwrap();
        assert_eq!("SYN|ACK", report.fields["flags"]);
        assert_eq!(ChecksumStatus::Ok, report.checksum);
    }

    #[test]
    fn test_ndp_unchecked_without_ipv6_addrs() {
        let report = decode(ProtocolConfig::Ndp, &[0x85; 24], None).unwrap();
        assert_eq!(ChecksumStatus::Unchecked, report.checksum);
        assert_eq!("RouterSolicitation (133)", report.fields["ndp_type"]);
    }

    #[test]
    fn test_http_headers() {
        let report = decode(
            ProtocolConfig::Http,
            b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n",
            None,
        )
        .unwrap();
        assert_eq!(ChecksumStatus::Unchecked, report.checksum);
        assert_eq!("GET / HTTP/1.1", report.fields["start_line"]);
        assert_eq!("example.com", report.fields["header Host"]);
    }

    #[test]
    fn test_ssh() {
        let report = decode(ProtocolConfig::Ssh, b"SSH-2.0-OpenSSH_9.6\r\n", None).unwrap();
        assert_eq!("SSH", report.fields["protocol_version"]);
        assert_eq!("2.0-OpenSSH_9.6", report.fields["software_version"]);
    }

    #[test]
    fn test_decode_too_short() {
        let err = decode(ProtocolConfig::Ethernet, &[0x01, 0x02, 0x03], None).unwrap_err();
        assert_eq!("failed to decode ethernet packet", err.to_string());
        assert_eq!(
            "insufficient buffer for EthernetFrame packet, minimum=64, provided=3",
            err.root_cause().to_string()
        );
    }

    #[test]
    fn test_decode_invalid_format() {
        let err = decode(ProtocolConfig::Ftp, b"USER anonymous", None).unwrap_err();
        assert_eq!(
            "invalid FtpLine format: missing trailing CRLF",
            err.root_cause().to_string()
        );
    }
}
