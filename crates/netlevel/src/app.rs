use crate::config::{LogFormat, LogSpanEvents, Mode, NetlevelConfig};
use crate::{decode, report};
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the netlevel application.
pub fn run_netlevel(cfg: &NetlevelConfig) -> anyhow::Result<()> {
    configure_logging(cfg);
    let report = decode::decode(cfg.protocol, &cfg.packet, cfg.checksum_addrs)?;
    match cfg.mode {
        Mode::Pretty => report::table::report_pretty(&report),
        Mode::Json => report::json::report(&report),
    }
}

fn configure_logging(cfg: &NetlevelConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .json()
                    .init();
            }
        }
    }
}
