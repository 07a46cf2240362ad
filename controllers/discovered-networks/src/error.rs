//! Run-level error types.
//!
//! Every fatal failure names the stage it happened in. Per-network lookup
//! failures are not errors here; they become `Unknown` records.

use thiserror::Error;
use wapi_client::WapiError;

/// Errors that abort a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Credential check failed before any paging
    #[error("Credential check failed: {0}")]
    Credentials(#[source] WapiError),

    /// Discovered device page could not be retrieved
    #[error("Page retrieval failed on page {page}: {source}")]
    PageRetrieval {
        page: u32,
        #[source]
        source: WapiError,
    },

    /// IPAM lookup failed in a way that invalidates the whole run
    #[error("IPAM lookup failed for {network}: {source}")]
    IpamLookup {
        network: String,
        #[source]
        source: WapiError,
    },

    /// Client construction failed
    #[error("WAPI client error: {0}")]
    Client(#[from] WapiError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Output could not be written
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Table rendering failed
    #[error("Render error: {0}")]
    Render(String),
}
