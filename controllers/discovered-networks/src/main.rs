//! Discovered Networks Report
//!
//! Lists the networks NIOS network discovery has seen on devices and tags
//! each one with whether it is managed in IPAM:
//! - Walks `discovery:device` records with WAPI paging
//! - Looks each distinct network up in IPAM once per run
//! - Prints a table, or writes CSV to stdout or a file

mod backoff;
mod error;
mod pipeline;
mod reconciler;
mod render;
mod report;
mod settings;
#[cfg(test)]
mod test_utils;

use crate::error::ReportError;
use crate::pipeline::{RunOptions, run};
use crate::render::OutputFormat;
use crate::report::{Report, ReportOptions};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wapi_client::WapiClient;

#[derive(Debug, Parser)]
#[command(name = "discovered-networks")]
#[command(about = "Report NIOS discovered networks and whether they are in IPAM")]
struct Cli {
    /// Grid Master config file
    #[arg(short, long, default_value = "gm.ini")]
    config: PathBuf,

    /// Write CSV to this file instead of stdout
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Only report networks not in IPAM
    #[arg(short, long)]
    not_in_ipam: bool,

    /// Discovered devices per WAPI page
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Report each network once
    #[arg(short, long)]
    unique_networks: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "info,wapi_client=debug,discovered_networks=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let started = Instant::now();
    let result = execute(&cli).await;
    info!("Run time: {:.2?}", started.elapsed());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> Result<(), ReportError> {
    let config = settings::load_config(&cli.config)?;
    info!("Configuration:");
    info!("  Grid Master: {}", config.grid_master);
    info!("  API version: {}", config.api_version);
    info!("  Verify TLS: {}", config.verify_tls);

    let client = WapiClient::new(&config)?;
    let options = RunOptions {
        page_size: cli.page,
        report: ReportOptions {
            not_in_ipam_only: cli.not_in_ipam,
            unique_networks: cli.unique_networks,
        },
        ..RunOptions::default()
    };

    let report = run(&client, &options).await?;
    if report.summary.unknown > 0 {
        warn!("{} discovered networks have an unknown IPAM status", report.summary.unknown);
    }
    output(cli, &report)
}

fn output(cli: &Cli, report: &Report) -> Result<(), ReportError> {
    if let Some(path) = &cli.file {
        info!("Writing {} records to {}", report.records.len(), path.display());
        let file = File::create(path)?;
        return render::write_csv(report, BufWriter::new(file));
    }

    match cli.format {
        OutputFormat::Csv => render::write_csv(report, io::stdout().lock()),
        OutputFormat::Table => render::write_table(report, io::stdout().lock()),
    }
}
