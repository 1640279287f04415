//! HTTP error types that preserve status code information throughout the
//! error chain.
//!
//! The Amazon Ads API signals distinct recovery strategies by status code
//! (429 wait, 401/403 re-authenticate, 5xx retry), so the transport error
//! type keeps the status and a body snippet around instead of flattening
//! everything into a string.

use reqwest::StatusCode;

/// Maximum number of response-body characters carried in an error
pub const BODY_SNIPPET_LIMIT: usize = 1000;

/// HTTP client error types that preserve status code information
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// HTTP error response with status code and a body snippet
    #[error("HTTP {status}: {snippet}")]
    Http { status: u16, snippet: String },

    /// Network-level error (connection, DNS, etc.)
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Failed to parse response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        // If the reqwest error has a status code, preserve it as Http variant
        if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                snippet: err.to_string(),
            }
        } else if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

impl HttpError {
    /// Create an HTTP error from status code and body snippet
    pub fn http(status: u16, snippet: impl Into<String>) -> Self {
        let mut snippet = snippet.into();
        if snippet.len() > BODY_SNIPPET_LIMIT {
            let mut end = BODY_SNIPPET_LIMIT;
            while !snippet.is_char_boundary(end) {
                end -= 1;
            }
            snippet.truncate(end);
        }
        Self::Http { status, snippet }
    }

    /// Create an HTTP error from a StatusCode and body snippet
    pub fn from_status(status: StatusCode, snippet: impl Into<String>) -> Self {
        Self::http(status.as_u16(), snippet)
    }

    /// Get the HTTP status code if this is an HTTP error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code()
            .map(|s| (400..500).contains(&s))
            .unwrap_or(false)
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code()
            .map(|s| (500..600).contains(&s))
            .unwrap_or(false)
    }

    /// Check if this is an authentication/authorization error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        self.status_code()
            .map(|s| s == 401 || s == 403)
            .unwrap_or(false)
    }

    /// Check if the remote side signalled rate limiting (429)
    pub fn is_rate_limited(&self) -> bool {
        self.status_code().map(|s| s == 429).unwrap_or(false)
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout) || matches!(self, Self::Network(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_creation() {
        let err = HttpError::http(404, "Not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }

    #[test]
    fn test_snippet_is_truncated() {
        let err = HttpError::http(500, "x".repeat(5000));
        match err {
            HttpError::Http { snippet, .. } => assert_eq!(snippet.len(), BODY_SNIPPET_LIMIT),
            _ => panic!("expected Http variant"),
        }
    }

    #[test]
    fn test_is_client_error() {
        assert!(HttpError::http(400, "Bad Request").is_client_error());
        assert!(HttpError::http(404, "Not Found").is_client_error());
        assert!(!HttpError::http(500, "Server Error").is_client_error());
    }

    #[test]
    fn test_is_server_error() {
        assert!(HttpError::http(500, "Internal Server Error").is_server_error());
        assert!(HttpError::http(503, "Service Unavailable").is_server_error());
        assert!(!HttpError::http(404, "Not Found").is_server_error());
    }

    #[test]
    fn test_is_auth_error() {
        assert!(HttpError::http(401, "Unauthorized").is_auth_error());
        assert!(HttpError::http(403, "Forbidden").is_auth_error());
        assert!(!HttpError::http(400, "Bad Request").is_auth_error());
    }

    #[test]
    fn test_is_rate_limited() {
        assert!(HttpError::http(429, "Too Many Requests").is_rate_limited());
        assert!(!HttpError::http(500, "Server Error").is_rate_limited());
    }

    #[test]
    fn test_timeout_error() {
        let err = HttpError::Timeout;
        assert!(err.is_timeout());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "Request timeout");
    }
}
