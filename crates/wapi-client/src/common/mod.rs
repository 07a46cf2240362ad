//! Common utilities for the WAPI client
//!
//! Provides the authenticated HTTP wrapper, status classification and page
//! decoding shared by all object queries.

pub mod paginator;
pub mod query;

use crate::error::WapiError;
use crate::models::{Page, WapiErrorBody};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client wrapper with basic authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, username: String, password: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an object path and query parameters
    pub fn build_url(&self, path: &str, params: &[(String, String)]) -> String {
        let path = path.trim_start_matches('/');
        if params.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}?{}", self.base_url, path, query::build_query_string(params))
        }
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, WapiError> {
        let url = self.build_url(path, params);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("Body: {}", body);
            return Err(status_error(status, path, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            WapiError::Protocol(format!(
                "error decoding response body from {}: {} - Response (first 500 chars): {}",
                path,
                e,
                body.chars().take(500).collect::<String>()
            ))
        })
    }
}

/// Map a non-success status to the error taxonomy
pub fn status_error(status: StatusCode, path: &str, body: &str) -> WapiError {
    let detail = serde_json::from_str::<WapiErrorBody>(body)
        .ok()
        .and_then(|b| b.text.or(b.error))
        .unwrap_or_else(|| body.chars().take(500).collect());
    let message = format!("GET {} failed: {} - {}", path, status, detail);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WapiError::Authentication(message),
        StatusCode::NOT_FOUND => WapiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => WapiError::Transient(message),
        _ => WapiError::Api(message),
    }
}

/// Page body as received: an object when paging is honoured, a bare array
/// when the appliance ignored `_paging`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPage {
    Paged(Page<serde_json::Value>),
    Bare(Vec<serde_json::Value>),
}

impl RawPage {
    pub(crate) fn into_page(self, page_size: u32) -> Result<Page<serde_json::Value>, WapiError> {
        match self {
            Self::Paged(page) => Ok(page),
            Self::Bare(result) if result.len() < page_size as usize => Ok(Page {
                result,
                next_page_id: None,
            }),
            Self::Bare(result) => Err(WapiError::Protocol(format!(
                "unpaged response with {} records and no next_page_id",
                result.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_classification() {
        let body = r#"{"Error": "AdmConProtoError: Authorization required", "code": "Client.Ibap.Proto", "text": "Authorization required"}"#;
        let err = status_error(StatusCode::UNAUTHORIZED, "discovery:device", body);
        assert!(err.is_auth());
        assert!(err.to_string().contains("Authorization required"));

        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "network", "").is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "network", "").is_transient());
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "network", "bad"),
            WapiError::Api(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "network", ""),
            WapiError::NotFound(_)
        ));
    }

    #[test]
    fn test_paged_body() {
        let raw: RawPage = serde_json::from_value(json!({
            "result": [{"_ref": "a"}],
            "next_page_id": "789c"
        }))
        .unwrap();
        let page = raw.into_page(1).unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.next_page_id.as_deref(), Some("789c"));
    }

    #[test]
    fn test_short_bare_body_is_final_page() {
        let raw: RawPage = serde_json::from_value(json!([{"_ref": "a"}])).unwrap();
        let page = raw.into_page(5).unwrap();
        assert_eq!(page.result.len(), 1);
        assert!(page.next_page_id.is_none());
    }

    #[test]
    fn test_full_bare_body_is_protocol_error() {
        let raw: RawPage = serde_json::from_value(json!([{"_ref": "a"}, {"_ref": "b"}])).unwrap();
        assert!(matches!(raw.into_page(2), Err(WapiError::Protocol(_))));
    }

    #[test]
    fn test_body_without_result_does_not_decode() {
        assert!(serde_json::from_value::<RawPage>(json!({"next_page_id": "x"})).is_err());
    }

    #[test]
    fn test_build_url() {
        let http = HttpClient::new(
            Client::new(),
            "https://gm.example.com/wapi/v2.12/".to_string(),
            "admin".to_string(),
            "secret".to_string(),
        );
        assert_eq!(http.build_url("grid", &[]), "https://gm.example.com/wapi/v2.12/grid");
        assert_eq!(
            http.build_url("network", &[("network".to_string(), "10.0.0.0/8".to_string())]),
            "https://gm.example.com/wapi/v2.12/network?network=10.0.0.0%2F8"
        );
        assert!(!format!("{:?}", http).contains("secret"));
    }
}
