//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use crate::net::{FailureType, classify_http_status};

/// Errors that can occur while fetching a paper's PDF.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The paper has no open-access PDF location.
    #[error("no open-access PDF available for {paper_id}")]
    NoOpenAccessPdf {
        /// Identifier of the paper.
        paper_id: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// The response is not a PDF: neither the declared content type nor the
    /// leading bytes identify one.
    #[error("response from {url} is not a PDF (content-type: {content_type})")]
    ContentValidation {
        /// The URL that was fetched.
        url: String,
        /// Declared content type, or `unknown`.
        content_type: String,
    },

    /// File system error during download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or not HTTP(S).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DownloadError {
    /// Creates a missing-PDF error.
    pub fn no_open_access_pdf(paper_id: impl Into<String>) -> Self {
        Self::NoOpenAccessPdf {
            paper_id: paper_id.into(),
        }
    }

    /// Creates a network error from a reqwest error, detecting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error with an optional Retry-After value.
    pub fn http_status(url: impl Into<String>, status: u16, retry_after: Option<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a content validation error.
    pub fn content_validation(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self::ContentValidation {
            url: url.into(),
            content_type: content_type.unwrap_or("unknown").to_string(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Classifies a download error for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | HTTP status | per [`classify_http_status`] |
/// | Timeout, Network | Transient |
/// | ContentValidation, Io, InvalidUrl, NoOpenAccessPdf, ClientBuild | Permanent |
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::HttpStatus { status, .. } => classify_http_status(*status),
        DownloadError::Timeout { .. } | DownloadError::Network { .. } => FailureType::Transient,
        DownloadError::ContentValidation { .. }
        | DownloadError::Io { .. }
        | DownloadError::InvalidUrl { .. }
        | DownloadError::NoOpenAccessPdf { .. }
        | DownloadError::ClientBuild(_) => FailureType::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.pdf", 404, None);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/file.pdf"));
    }

    #[test]
    fn test_content_validation_display_defaults_type() {
        let error = DownloadError::content_validation("https://example.com/x", None);
        assert!(error.to_string().contains("content-type: unknown"));
    }

    #[test]
    fn test_io_display_contains_path() {
        let error = DownloadError::io(
            "/tmp/paper.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.to_string().contains("/tmp/paper.pdf"));
    }

    #[test]
    fn test_classify_error_retryable() {
        assert_eq!(
            classify_error(&DownloadError::timeout("u")),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&DownloadError::http_status("u", 503, None)),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&DownloadError::http_status("u", 429, Some("1".into()))),
            FailureType::RateLimited
        );
    }

    #[test]
    fn test_classify_error_permanent() {
        assert_eq!(
            classify_error(&DownloadError::http_status("u", 404, None)),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&DownloadError::content_validation("u", Some("text/html"))),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&DownloadError::no_open_access_pdf("p1")),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&DownloadError::invalid_url("ftp://x")),
            FailureType::Permanent
        );
    }
}
