//! Query descriptors for WAPI object searches
//!
//! Provides the object type, filters and return fields of a query, and
//! renders them together with the paging parameters.

/// Return fields requested for discovered devices
pub const DEVICE_RETURN_FIELDS: &[&str] = &[
    "address",
    "name",
    "network_view",
    "extattrs",
    "network_infos",
    "vendor",
    "type",
];

/// Return fields requested for IPAM networks
pub const NETWORK_RETURN_FIELDS: &[&str] = &["network", "network_view", "network_container", "comment"];

/// Object type, filters and return fields of a WAPI search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    object_type: String,
    filters: Vec<(String, String)>,
    return_fields: Vec<String>,
}

impl ObjectQuery {
    /// Create a query for an object type (e.g. `discovery:device`)
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            filters: Vec::new(),
            return_fields: Vec::new(),
        }
    }

    /// Query for discovered devices with their network infos
    pub fn discovered_devices() -> Self {
        Self::new("discovery:device").return_fields(DEVICE_RETURN_FIELDS)
    }

    /// Add a search filter
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Replace the return fields
    #[must_use]
    pub fn return_fields(mut self, fields: &[&str]) -> Self {
        self.return_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Query parameters without paging
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 1);
        if !self.return_fields.is_empty() {
            params.push(("_return_fields".to_string(), self.return_fields.join(",")));
        }
        params.extend(self.filters.iter().cloned());
        params
    }

    /// Query parameters for one page request
    ///
    /// Every page repeats the paging parameters; WAPI rejects a `_page_id`
    /// request whose `_max_results` differs from the first page.
    pub fn page_params(&self, page_size: u32, page_id: Option<&str>) -> Vec<(String, String)> {
        let mut params = vec![
            ("_paging".to_string(), "1".to_string()),
            ("_max_results".to_string(), page_size.to_string()),
            ("_return_as_object".to_string(), "1".to_string()),
        ];
        params.extend(self.params());
        if let Some(page_id) = page_id {
            params.push(("_page_id".to_string(), page_id.to_string()));
        }
        params
    }
}

/// Build a query string from key/value pairs
pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_params() {
        let query = ObjectQuery::discovered_devices();
        let qs = build_query_string(&query.page_params(5, None));
        assert_eq!(
            qs,
            "_paging=1&_max_results=5&_return_as_object=1\
             &_return_fields=address%2Cname%2Cnetwork_view%2Cextattrs%2Cnetwork_infos%2Cvendor%2Ctype"
        );
    }

    #[test]
    fn test_next_page_params_carry_token() {
        let query = ObjectQuery::new("network").filter("network_view", "default");
        let params = query.page_params(100, Some("789c:abc"));
        assert_eq!(params.last(), Some(&("_page_id".to_string(), "789c:abc".to_string())));
        assert!(params.contains(&("network_view".to_string(), "default".to_string())));
        assert!(params.contains(&("_max_results".to_string(), "100".to_string())));
    }

    #[test]
    fn test_filters_are_encoded() {
        let query = ObjectQuery::new("network").filter("network", "10.0.0.0/24");
        assert_eq!(build_query_string(&query.params()), "network=10.0.0.0%2F24");
    }
}
