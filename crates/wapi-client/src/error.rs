//! WAPI client errors

use thiserror::Error;

/// Errors that can occur when interacting with the NIOS WAPI
#[derive(Debug, Error)]
pub enum WapiError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Appliance temporarily unavailable (rate limited, gateway error, etc.)
    #[error("Transient network error: {0}")]
    Transient(String),

    /// Authentication failed (bad credentials, insufficient permissions)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The appliance broke the paging or payload contract
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// WAPI returned an error
    #[error("WAPI error: {0}")]
    Api(String),

    /// Invalid request (e.g., zero page size)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl WapiError {
    /// Whether retrying the same request may succeed.
    ///
    /// Connection failures, resets and timeouts surface as
    /// [`WapiError::Http`]; 429 and gateway statuses are mapped to
    /// [`WapiError::Transient`].
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }

    /// Whether the appliance rejected the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(WapiError::Transient("503".to_string()).is_transient());
        assert!(!WapiError::Protocol("loop".to_string()).is_transient());
        assert!(!WapiError::Authentication("401".to_string()).is_transient());
        assert!(WapiError::Authentication("401".to_string()).is_auth());
        assert!(!WapiError::Api("400".to_string()).is_auth());
    }
}
