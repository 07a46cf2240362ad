//! NIOS WAPI Client
//!
//! A Rust client library for the read side of the Infoblox NIOS WAPI.
//! Provides typed models for discovered devices and IPAM networks, and a
//! paginator that walks paged search results.
//!
//! # Example
//!
//! ```no_run
//! use wapi_client::{DiscoveredDevice, ObjectQuery, WapiClient, WapiClientTrait, WapiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WapiConfig {
//!     grid_master: "gm.example.com".to_string(),
//!     api_version: "v2.12".to_string(),
//!     username: "admin".to_string(),
//!     password: "infoblox".to_string(),
//!     verify_tls: true,
//!     timeout: wapi_client::DEFAULT_TIMEOUT,
//! };
//! let client = WapiClient::new(&config)?;
//!
//! // Walk discovered devices 100 at a time
//! let mut pages = client.paginate::<DiscoveredDevice>(ObjectQuery::discovered_devices(), 100);
//! while let Some(devices) = pages.next_page().await? {
//!     for device in devices {
//!         println!("{} on {} networks", device.display_name(), device.network_infos.len());
//!     }
//! }
//!
//! // Exact IPAM lookup
//! let networks = client.query_ipam_networks("10.0.0.0/24", "default").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Paging**: `_paging`/`_page_id` walks with loop detection
//! - **IPAM lookups**: exact network search for IPv4 and IPv6
//! - **Error taxonomy**: transient, authentication and protocol failures are distinct

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod wapi_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::WapiClient;
pub use common::HttpClient;
pub use common::paginator::Paginator;
pub use common::query::{DEVICE_RETURN_FIELDS, NETWORK_RETURN_FIELDS, ObjectQuery};
pub use config::{DEFAULT_TIMEOUT, WapiConfig};
pub use error::WapiError;
pub use models::*;
pub use wapi_trait::WapiClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockFailure, MockWapiClient};
