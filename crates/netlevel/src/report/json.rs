use crate::report::Report;
use tracing::instrument;

/// Generate a json report of a decoded packet.
#[instrument(skip_all, level = "trace")]
pub fn report(report: &Report) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), report)?;
    println!();
    Ok(())
}
