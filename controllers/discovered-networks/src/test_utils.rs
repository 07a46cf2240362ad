//! Test utilities for unit testing the reconciler and pipeline
//!
//! This module provides helpers for creating discovered devices and IPAM
//! networks, and for seeding a mock client with them.

use serde_json::json;
use wapi_client::{DiscoveredDevice, IpamNetwork, MockWapiClient};

/// Helper to create a `discovery:device` record as WAPI returns it
pub fn device_json(name: &str, network_view: &str, networks: &[&str]) -> serde_json::Value {
    let network_infos: Vec<_> = networks.iter().map(|n| json!({ "network_str": n })).collect();
    json!({
        "_ref": format!("discovery:device/ZG5zLmRpc2NvdmVyeV9kZXZpY2U:{}", name),
        "name": name,
        "network_view": network_view,
        "network_infos": network_infos,
    })
}

/// Helper to create a typed discovered device
pub fn device(name: &str, network_view: &str, networks: &[&str]) -> DiscoveredDevice {
    serde_json::from_value(device_json(name, network_view, networks)).expect("valid device fixture")
}

/// Helper to create an IPAM network
pub fn ipam_network(network: &str, network_view: &str, container: Option<&str>) -> IpamNetwork {
    IpamNetwork {
        reference: format!("network/ZG5zLm5ldHdvcms:{}/{}", network, network_view),
        network: network.to_string(),
        network_view: network_view.to_string(),
        network_container: container.map(str::to_string),
        comment: None,
    }
}

/// Mock client holding the three-device fixture: two switches on
/// 10.0.0.0/24 (managed) and a router on 10.1.0.0/24 (unmanaged)
pub fn fixture_client() -> MockWapiClient {
    let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
    mock.add_device(device_json("sw1", "default", &["10.0.0.0/24"]));
    mock.add_device(device_json("sw2", "default", &["10.0.0.0/24"]));
    mock.add_device(device_json("rtr1", "default", &["10.1.0.0/24"]));
    mock.add_ipam_network(ipam_network("10.0.0.0/24", "default", Some("10.0.0.0/16")));
    mock
}
