//! NIOS WAPI client
//!
//! Implements the read side of the WAPI used for discovery reconciliation:
//! paged object searches and IPAM network lookups.

use crate::common::query::{NETWORK_RETURN_FIELDS, ObjectQuery};
use crate::common::{HttpClient, RawPage};
use crate::config::WapiConfig;
use crate::error::WapiError;
use crate::models::*;
use crate::wapi_trait::WapiClientTrait;
use reqwest::Client;
use tracing::debug;

/// NIOS WAPI client
///
/// One client is created per run; it holds the connection pool and the
/// credentials and is shared by reference.
#[derive(Debug)]
pub struct WapiClient {
    http: HttpClient,
}

impl WapiClient {
    /// Create a new WAPI client
    ///
    /// # Arguments
    /// * `config` - Validated connection parameters
    pub fn new(config: &WapiConfig) -> Result<Self, WapiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            http: HttpClient::new(
                client,
                config.base_url(),
                config.username.clone(),
                config.password.clone(),
            ),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Validate the credentials by making a lightweight authenticated request.
    ///
    /// # Returns
    /// * `Ok(())` - Credentials accepted and the Grid Master is reachable
    /// * `Err(WapiError)` - Credentials rejected or the Grid Master is unreachable
    pub async fn validate_credentials(&self) -> Result<(), WapiError> {
        debug!("Validating WAPI credentials and connectivity");
        let _: serde_json::Value = self.http.get("grid", &[]).await?;
        debug!("Credentials validated successfully");
        Ok(())
    }

    /// Fetch one page of a paged search
    ///
    /// # Arguments
    /// * `query` - Object type, filters and return fields
    /// * `page_size` - `_max_results` for the request
    /// * `page_id` - Continuation token from the previous page, `None` for the first page
    pub async fn fetch_page(
        &self,
        query: &ObjectQuery,
        page_size: u32,
        page_id: Option<&str>,
    ) -> Result<Page<serde_json::Value>, WapiError> {
        let params = query.page_params(page_size, page_id);
        let raw: RawPage = self.http.get(query.object_type(), &params).await?;
        raw.into_page(page_size)
    }

    /// Search IPAM networks by exact CIDR within a network view
    ///
    /// IPv6 networks live in a separate `ipv6network` collection.
    pub async fn query_ipam_networks(
        &self,
        network: &str,
        network_view: &str,
    ) -> Result<Vec<IpamNetwork>, WapiError> {
        let object_type = if network.contains(':') { "ipv6network" } else { "network" };
        let query = ObjectQuery::new(object_type)
            .return_fields(NETWORK_RETURN_FIELDS)
            .filter("network", network)
            .filter("network_view", network_view);

        debug!("Querying {} {} in view {}", object_type, network, network_view);
        self.http.get(object_type, &query.params()).await
    }
}

#[async_trait::async_trait]
impl WapiClientTrait for WapiClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn validate_credentials(&self) -> Result<(), WapiError> {
        self.validate_credentials().await
    }

    async fn fetch_page(
        &self,
        query: &ObjectQuery,
        page_size: u32,
        page_id: Option<&str>,
    ) -> Result<Page<serde_json::Value>, WapiError> {
        self.fetch_page(query, page_size, page_id).await
    }

    async fn query_ipam_networks(
        &self,
        network: &str,
        network_view: &str,
    ) -> Result<Vec<IpamNetwork>, WapiError> {
        self.query_ipam_networks(network, network_view).await
    }
}
