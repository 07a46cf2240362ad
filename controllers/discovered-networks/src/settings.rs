//! Configuration for the discovered networks report.
//!
//! Connection parameters are read from the `[NIOS]` section of an INI file
//! (default `gm.ini`):
//!
//! ```ini
//! [NIOS]
//! gm = 'gm.example.com'
//! api_version = 'v2.12'
//! valid_cert = 'true'
//! user = 'admin'
//! pass = 'infoblox'
//! ```
//!
//! Any key can be overridden with a `WAPI_NIOS__<KEY>` environment variable.
//! Values are validated once into an immutable [`WapiConfig`].

use crate::error::ReportError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use wapi_client::{DEFAULT_TIMEOUT, WapiConfig};

/// `[NIOS]` section as written in the file
#[derive(Debug, Default, Deserialize)]
struct RawNiosSection {
    #[serde(default)]
    gm: String,
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    valid_cert: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    pass: String,
    #[serde(default)]
    timeout_secs: Option<String>,
}

/// Load and validate connection parameters from an INI file
pub fn load_config(path: &Path) -> Result<WapiConfig, ReportError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ReportError::InvalidConfig(format!("config path is not UTF-8: {}", path.display())))?;

    let cfg = config::Config::builder()
        .add_source(config::File::new(path_str, config::FileFormat::Ini).required(true))
        .add_source(
            config::Environment::with_prefix("WAPI")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let raw = nios_section(&cfg, path)?;
    debug!("Loaded NIOS section from {}", path.display());
    validate(raw)
}

fn nios_section(cfg: &config::Config, path: &Path) -> Result<RawNiosSection, ReportError> {
    for key in ["nios", "NIOS"] {
        match cfg.get::<RawNiosSection>(key) {
            Ok(raw) => return Ok(raw),
            Err(config::ConfigError::NotFound(_)) => {}
            Err(e) => {
                return Err(ReportError::InvalidConfig(format!(
                    "Invalid NIOS section in config file {}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }
    Err(ReportError::InvalidConfig(format!(
        "No NIOS section in config file: {}",
        path.display()
    )))
}

fn validate(raw: RawNiosSection) -> Result<WapiConfig, ReportError> {
    let grid_master = required("gm", &raw.gm)?;
    let username = required("user", &raw.user)?;

    let api_version = required("api_version", &raw.api_version)?;
    let api_version = if api_version.starts_with('v') {
        api_version
    } else {
        format!("v{}", api_version)
    };

    let verify_tls = match unquote(&raw.valid_cert).to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "0" => false,
        "true" | "yes" | "1" => true,
        other => {
            return Err(ReportError::InvalidConfig(format!(
                "valid_cert must be true or false, got '{}'",
                other
            )));
        }
    };

    let timeout = match raw.timeout_secs.as_deref().map(unquote) {
        None | Some("") => DEFAULT_TIMEOUT,
        Some(secs) => match secs.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ReportError::InvalidConfig(format!(
                    "timeout_secs must be a positive integer, got '{}'",
                    secs
                )));
            }
        },
    };

    Ok(WapiConfig {
        grid_master,
        api_version,
        username,
        password: unquote(&raw.pass).to_string(),
        verify_tls,
        timeout,
    })
}

fn required(key: &str, value: &str) -> Result<String, ReportError> {
    let value = unquote(value);
    if value.is_empty() {
        return Err(ReportError::InvalidConfig(format!("Key {} not found in NIOS section", key)));
    }
    Ok(value.to_string())
}

/// Strip surrounding whitespace and quotes
fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '\'' || c == '"')
}
