//! Mock WapiClient for unit testing
//!
//! This module provides a mock implementation of WapiClientTrait that can be used
//! in unit tests without requiring a running Grid Master.
//!
//! Pages are served from an in-memory record list with the same paging rules
//! as WAPI: a `next_page_id` is returned while records remain after the
//! current page. Failures, repeated tokens and request counts can be
//! configured per test.

use crate::common::query::ObjectQuery;
use crate::error::WapiError;
use crate::models::*;
use crate::wapi_trait::WapiClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const PAGE_ID_PREFIX: &str = "mock-page-";
const REPEATED_PAGE_ID: &str = "mock-page-repeat";

/// Failure to inject into a mock response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Transient,
    Authentication,
    Api,
    Protocol,
}

impl MockFailure {
    fn to_error(self, context: &str) -> WapiError {
        match self {
            Self::Transient => WapiError::Transient(format!("{}: 503 Service Unavailable", context)),
            Self::Authentication => WapiError::Authentication(format!("{}: 401 Unauthorized", context)),
            Self::Api => WapiError::Api(format!("{}: 400 Bad Request", context)),
            Self::Protocol => WapiError::Protocol(format!("{}: malformed response", context)),
        }
    }
}

/// Mock WapiClient for testing
///
/// Clones share state, so a test can keep a handle for assertions while the
/// code under test owns another.
#[derive(Debug, Clone)]
pub struct MockWapiClient {
    base_url: String,
    // In-memory storage keyed by object type
    objects: Arc<Mutex<HashMap<String, Vec<serde_json::Value>>>>,
    ipam_networks: Arc<Mutex<Vec<IpamNetwork>>>,
    // Page number (1-based) -> (failure, remaining occurrences)
    page_failures: Arc<Mutex<HashMap<u32, (MockFailure, u32)>>>,
    // CIDR -> (failure, remaining occurrences)
    lookup_failures: Arc<Mutex<HashMap<String, (MockFailure, u32)>>>,
    reject_credentials: Arc<Mutex<bool>>,
    repeat_page_id: Arc<Mutex<bool>>,
    token_on_exhausted_page: Arc<Mutex<bool>>,
    // Request logs
    page_requests: Arc<Mutex<Vec<Option<String>>>>,
    lookups: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockWapiClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            ipam_networks: Arc::new(Mutex::new(Vec::new())),
            page_failures: Arc::new(Mutex::new(HashMap::new())),
            lookup_failures: Arc::new(Mutex::new(HashMap::new())),
            reject_credentials: Arc::new(Mutex::new(false)),
            repeat_page_id: Arc::new(Mutex::new(false)),
            token_on_exhausted_page: Arc::new(Mutex::new(false)),
            page_requests: Arc::new(Mutex::new(Vec::new())),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a raw record of any object type (for test setup)
    pub fn add_object(&self, object_type: &str, record: serde_json::Value) {
        self.objects
            .lock()
            .unwrap()
            .entry(object_type.to_string())
            .or_default()
            .push(record);
    }

    /// Add a `discovery:device` record (for test setup)
    pub fn add_device(&self, record: serde_json::Value) {
        self.add_object("discovery:device", record);
    }

    /// Add an IPAM network (for test setup)
    pub fn add_ipam_network(&self, network: IpamNetwork) {
        self.ipam_networks.lock().unwrap().push(network);
    }

    /// Fail the request for `page` (1-based) `times` times before serving it
    pub fn fail_page(&self, page: u32, times: u32, failure: MockFailure) {
        self.page_failures.lock().unwrap().insert(page, (failure, times));
    }

    /// Fail IPAM lookups for `network` `times` times
    pub fn fail_lookup(&self, network: &str, times: u32, failure: MockFailure) {
        self.lookup_failures
            .lock()
            .unwrap()
            .insert(network.to_string(), (failure, times));
    }

    /// Reject the credential check
    pub fn set_reject_credentials(&self, reject: bool) {
        *self.reject_credentials.lock().unwrap() = reject;
    }

    /// Return the same `next_page_id` on every page
    pub fn set_repeat_page_id(&self, repeat: bool) {
        *self.repeat_page_id.lock().unwrap() = repeat;
    }

    /// Return a `next_page_id` on an exactly full last page, as some
    /// appliances do; the following page is then empty
    pub fn set_token_on_exhausted_page(&self, enabled: bool) {
        *self.token_on_exhausted_page.lock().unwrap() = enabled;
    }

    /// Number of page requests received, including failed ones
    pub fn page_requests(&self) -> usize {
        self.page_requests.lock().unwrap().len()
    }

    /// Number of IPAM lookups received, including failed ones
    pub fn ipam_lookups(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }

    /// Number of IPAM lookups received for one CIDR
    pub fn lookups_for(&self, network: &str) -> usize {
        self.lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == network)
            .count()
    }

    fn take_failure<K: std::hash::Hash + Eq>(
        failures: &Mutex<HashMap<K, (MockFailure, u32)>>,
        key: &K,
    ) -> Option<MockFailure> {
        let mut failures = failures.lock().unwrap();
        match failures.get_mut(key) {
            Some((failure, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Some(*failure)
            }
            _ => None,
        }
    }

    fn offset_for(page_id: Option<&str>, page_size: usize) -> Result<usize, WapiError> {
        match page_id {
            None => Ok(0),
            Some(REPEATED_PAGE_ID) => Ok(page_size),
            Some(token) => token
                .strip_prefix(PAGE_ID_PREFIX)
                .and_then(|offset| offset.parse().ok())
                .ok_or_else(|| WapiError::Api(format!("unknown _page_id {}", token))),
        }
    }
}

#[async_trait::async_trait]
impl WapiClientTrait for MockWapiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_credentials(&self) -> Result<(), WapiError> {
        if *self.reject_credentials.lock().unwrap() {
            return Err(MockFailure::Authentication.to_error("GET grid"));
        }
        Ok(())
    }

    async fn fetch_page(
        &self,
        query: &ObjectQuery,
        page_size: u32,
        page_id: Option<&str>,
    ) -> Result<Page<serde_json::Value>, WapiError> {
        self.page_requests
            .lock()
            .unwrap()
            .push(page_id.map(str::to_string));

        let page_size = page_size as usize;
        let offset = Self::offset_for(page_id, page_size)?;
        let page_number = u32::try_from(offset / page_size.max(1) + 1).unwrap_or(u32::MAX);

        if let Some(failure) = Self::take_failure(&self.page_failures, &page_number) {
            return Err(failure.to_error(&format!("GET {} page {}", query.object_type(), page_number)));
        }

        let objects = self.objects.lock().unwrap();
        let records = objects.get(query.object_type()).map(Vec::as_slice).unwrap_or_default();
        let end = (offset + page_size).min(records.len());
        let result = records.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();

        let more = end < records.len()
            || (*self.token_on_exhausted_page.lock().unwrap() && result.len() == page_size);
        let next_page_id = if !more {
            None
        } else if *self.repeat_page_id.lock().unwrap() {
            Some(REPEATED_PAGE_ID.to_string())
        } else {
            Some(format!("{}{}", PAGE_ID_PREFIX, end))
        };

        Ok(Page { result, next_page_id })
    }

    async fn query_ipam_networks(
        &self,
        network: &str,
        network_view: &str,
    ) -> Result<Vec<IpamNetwork>, WapiError> {
        self.lookups
            .lock()
            .unwrap()
            .push((network.to_string(), network_view.to_string()));

        if let Some(failure) = Self::take_failure(&self.lookup_failures, &network.to_string()) {
            return Err(failure.to_error(&format!("GET network {}", network)));
        }

        Ok(self
            .ipam_networks
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.network == network && n.network_view == network_view)
            .cloned()
            .collect())
    }
}
