//! Report rendering
//!
//! Renders an assembled [`Report`] as CSV or as a console table. Rendering
//! only reads the report.

use crate::error::ReportError;
use crate::report::{Report, Summary};
use clap::ValueEnum;
use prettytable::{Table, row};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    #[default]
    Table,
}

fn report_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["network", "discovered device name", "in_ipam", "container"]);
    for record in &report.records {
        table.add_row(row![
            record.network.cidr,
            record.device,
            record.status.label(),
            record.status.container().unwrap_or_default()
        ]);
    }
    table
}

/// Write the report records as CSV with a header line
pub fn write_csv<W: Write>(report: &Report, writer: W) -> Result<(), ReportError> {
    let mut csv = report_table(report)
        .to_csv(writer)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    csv.flush()?;
    Ok(())
}

/// Print the report records as a table followed by the summary
pub fn write_table<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    report_table(report).print(&mut writer)?;
    writeln!(writer, "{}", summary_line(&report.summary))?;
    Ok(())
}

pub fn summary_line(summary: &Summary) -> String {
    format!(
        "{} devices ({} without networks), {} discovered networks, {} unique, {} IPAM lookups, {} not in IPAM, {} unknown",
        summary.devices_seen,
        summary.devices_without_networks,
        summary.total_discovered,
        summary.unique_networks,
        summary.lookups_issued,
        summary.not_in_ipam,
        summary.unknown
    )
}
