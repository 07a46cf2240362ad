//! WapiClient trait for mocking
//!
//! This trait abstracts the WapiClient to enable mocking in unit tests.
//! The concrete WapiClient implements this trait, and tests can use mock implementations.

use crate::common::paginator::Paginator;
use crate::common::query::ObjectQuery;
use crate::error::WapiError;
use crate::models::*;
use serde::de::DeserializeOwned;

/// Trait for NIOS WAPI read operations
///
/// All async methods must be `Send` to work with Tokio's runtime.
#[async_trait::async_trait]
pub trait WapiClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Check that the credentials are accepted
    async fn validate_credentials(&self) -> Result<(), WapiError>;

    /// Fetch one page of a query; `page_id` is the token returned by the previous page
    async fn fetch_page(
        &self,
        query: &ObjectQuery,
        page_size: u32,
        page_id: Option<&str>,
    ) -> Result<Page<serde_json::Value>, WapiError>;

    /// Search the IPAM network collection for `network` within `network_view`
    async fn query_ipam_networks(
        &self,
        network: &str,
        network_view: &str,
    ) -> Result<Vec<IpamNetwork>, WapiError>;

    /// Start a fresh paged walk over `query`
    fn paginate<T: DeserializeOwned>(&self, query: ObjectQuery, page_size: u32) -> Paginator<'_, Self, T>
    where
        Self: Sized,
    {
        Paginator::new(self, query, page_size)
    }
}
