use crate::report::Report;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use tracing::instrument;

/// Generate a pretty table report of a decoded packet.
#[instrument(skip_all, level = "trace")]
pub fn report_pretty(report: &Report) -> anyhow::Result<()> {
    println!("{}", make_table(report));
    Ok(())
}

fn make_table(report: &Report) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec!["protocol", report.protocol.as_str()]);
    table.add_row(vec![String::from("valid"), report.valid.to_string()]);
    table.add_row(vec![String::from("checksum"), report.checksum.to_string()]);
    for (name, value) in &report.fields {
        table.add_row(vec![name, value]);
    }
    table
}
