//! Error types for the search module.

use std::time::Duration;

use thiserror::Error;

use crate::net::{FailureType, classify_http_status};

/// Errors raised by a [`PaperSource`](super::PaperSource).
#[derive(Debug, Error)]
pub enum SearchError {
    /// Retryable failure: 429, 500, 502, 503, 504, timeouts and connection errors.
    #[error("transient error querying {url}: {message}")]
    TransientNetwork {
        /// Request URL.
        url: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Server-mandated delay from a Retry-After header.
        retry_after: Option<Duration>,
        /// Human-readable detail.
        message: String,
    },

    /// Non-retryable failure: bad query or a 4xx other than 429.
    #[error("request rejected: {message}")]
    PermanentRequest {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Human-readable detail.
        message: String,
    },

    /// A response arrived but its body is empty or not valid JSON.
    #[error("malformed response from {url}: {message}")]
    MalformedResponse {
        /// Request URL.
        url: String,
        /// Human-readable detail.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl SearchError {
    /// Creates an error from a non-success HTTP status.
    pub fn from_status(url: impl Into<String>, status: u16, retry_after: Option<Duration>) -> Self {
        if classify_http_status(status).is_retryable() {
            Self::TransientNetwork {
                url: url.into(),
                status: Some(status),
                retry_after,
                message: format!("HTTP {status}"),
            }
        } else {
            Self::PermanentRequest {
                status: Some(status),
                message: format!("HTTP {status} from {}", url.into()),
            }
        }
    }

    /// Creates a transient error from a transport failure.
    pub fn network(url: impl Into<String>, source: &reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else {
            source.to_string()
        };
        Self::TransientNetwork {
            url: url.into(),
            status: None,
            retry_after: None,
            message,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a permanent error for an invalid request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::PermanentRequest {
            status: None,
            message: message.into(),
        }
    }

    /// Classifies this error for retry decisions.
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        match self {
            Self::TransientNetwork {
                status: Some(429), ..
            } => FailureType::RateLimited,
            Self::TransientNetwork { .. } => FailureType::Transient,
            Self::PermanentRequest { .. } | Self::MalformedResponse { .. } | Self::ClientBuild(_) => {
                FailureType::Permanent
            }
        }
    }

    /// Server-mandated delay, if the server sent one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::TransientNetwork { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classifies_retryable_codes() {
        for status in [429, 500, 502, 503, 504] {
            let err = SearchError::from_status("https://api.test/search", status, None);
            assert!(matches!(err, SearchError::TransientNetwork { .. }), "{status}");
        }
        let err = SearchError::from_status("https://api.test/search", 429, None);
        assert_eq!(err.failure_type(), FailureType::RateLimited);
    }

    #[test]
    fn test_from_status_other_client_errors_are_permanent() {
        for status in [400, 401, 403, 404] {
            let err = SearchError::from_status("https://api.test/search", status, None);
            assert!(matches!(err, SearchError::PermanentRequest { .. }));
            assert_eq!(err.failure_type(), FailureType::Permanent);
        }
    }

    #[test]
    fn test_retry_after_only_on_transient() {
        let err = SearchError::from_status("u", 429, Some(Duration::from_secs(3)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(SearchError::invalid_request("empty").retry_after(), None);
    }

    #[test]
    fn test_display_contains_context() {
        let err = SearchError::malformed("https://api.test/search", "empty body");
        let msg = err.to_string();
        assert!(msg.contains("https://api.test/search"));
        assert!(msg.contains("empty body"));
    }
}
