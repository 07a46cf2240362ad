//! Connection parameters for a Grid Master

use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection parameters for one appliance
///
/// Built once at startup and passed by reference to [`crate::WapiClient::new`].
#[derive(Clone, PartialEq, Eq)]
pub struct WapiConfig {
    /// Grid Master host name or address. An explicit `http://` or
    /// `https://` scheme is kept as given.
    pub grid_master: String,
    /// WAPI version, e.g. `v2.12`
    pub api_version: String,
    pub username: String,
    pub password: String,
    /// Verify the appliance TLS certificate
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl WapiConfig {
    /// Base URL of the WAPI endpoint, e.g. `https://gm.example.com/wapi/v2.12`
    pub fn base_url(&self) -> String {
        let host = self.grid_master.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/wapi/{}", host, self.api_version)
        } else {
            format!("https://{}/wapi/{}", host, self.api_version)
        }
    }
}

impl std::fmt::Debug for WapiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WapiConfig")
            .field("grid_master", &self.grid_master)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .field("password", &"********")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(grid_master: &str) -> WapiConfig {
        WapiConfig {
            grid_master: grid_master.to_string(),
            api_version: "v2.12".to_string(),
            username: "admin".to_string(),
            password: "infoblox".to_string(),
            verify_tls: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(config("gm.example.com").base_url(), "https://gm.example.com/wapi/v2.12");
        assert_eq!(config("http://127.0.0.1:8080/").base_url(), "http://127.0.0.1:8080/wapi/v2.12");
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config("gm.example.com"));
        assert!(!rendered.contains("infoblox"));
        assert!(rendered.contains("gm.example.com"));
    }
}
