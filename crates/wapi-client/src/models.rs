//! WAPI object models
//!
//! These models match the objects returned by the NIOS WAPI when queried with
//! `_return_as_object=1`. Fields that the appliance omits for a given object
//! default to empty values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Network view assumed when an object carries none
pub const DEFAULT_NETWORK_VIEW: &str = "default";

/// One page of a paged WAPI query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub result: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_id: Option<String>,
}

/// Discovered device (`discovery:device` object)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_network_view")]
    pub network_view: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    /// Epoch seconds, only present on appliances that return it
    #[serde(default)]
    pub last_discovered: Option<i64>,
    #[serde(default)]
    pub extattrs: HashMap<String, ExtAttr>,
    #[serde(default)]
    pub network_infos: Vec<NetworkInfo>,
}

impl DiscoveredDevice {
    /// Name used to identify the device in reports: name, then address, then reference.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.address.as_deref().filter(|a| !a.is_empty()))
            .unwrap_or(&self.reference)
    }
}

/// Network a discovered device was seen on (`network_infos` entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Reference to the IPAM network object, set by the appliance when it
    /// believes the network is managed
    #[serde(default)]
    pub network: Option<String>,
    /// The network in CIDR notation
    pub network_str: String,
}

/// Extensible attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtAttr {
    pub value: serde_json::Value,
}

/// IPAM network (`network` or `ipv6network` object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamNetwork {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub network: String,
    #[serde(default = "default_network_view")]
    pub network_view: String,
    #[serde(default)]
    pub network_container: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Error body returned by WAPI on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct WapiErrorBody {
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

fn default_network_view() -> String {
    DEFAULT_NETWORK_VIEW.to_string()
}
