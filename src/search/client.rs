//! Semantic Scholar Graph API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::SearchError;
use super::{MAX_RESULTS_PER_REQUEST, PaperSource, SearchPage};
use crate::net::constants::{CONNECT_TIMEOUT_SECS, SEARCH_READ_TIMEOUT_SECS};
use crate::net::{RateLimiter, RetryDecision, RetryPolicy, build_client, parse_retry_after};
use crate::paper::{PaperMetadata, RawPaperRecord};

/// Public Graph API root.
pub const SEMANTIC_SCHOLAR_API_URL: &str = "https://api.semanticscholar.org/graph/v1";

/// Fields requested for every search result.
pub const SEARCH_FIELDS: &str = "title,authors,year,abstract,paperId,citationCount,openAccessPdf";

/// Header carrying the optional API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Settings for [`SemanticScholarClient`].
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    /// API root; `/paper/search` is appended.
    pub base_url: String,
    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub read_timeout: Duration,
    /// Retry behavior for transient failures.
    pub retry_policy: RetryPolicy,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            base_url: SEMANTIC_SCHOLAR_API_URL.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(SEARCH_READ_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Rate-limited, retrying search client for the Semantic Scholar Graph API.
///
/// Every request goes through the shared [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct SemanticScholarClient {
    client: Client,
    search_url: Url,
    api_key: Option<String>,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
}

impl SemanticScholarClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::PermanentRequest`] if `base_url` is not a valid
    /// URL, or [`SearchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: SearchClientConfig, rate_limiter: Arc<RateLimiter>) -> Result<Self, SearchError> {
        let base = config.base_url.trim_end_matches('/');
        let search_url = Url::parse(&format!("{base}/paper/search"))
            .map_err(|e| SearchError::invalid_request(format!("invalid base URL {base}: {e}")))?;
        let client = build_client(config.connect_timeout, config.read_timeout)
            .map_err(SearchError::ClientBuild)?;

        debug!(
            url = %search_url,
            has_api_key = config.api_key.is_some(),
            max_attempts = config.retry_policy.max_attempts(),
            "creating search client"
        );

        Ok(Self {
            client,
            search_url,
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
            rate_limiter,
            retry_policy: config.retry_policy,
        })
    }

    fn request_url(&self, query: &str, limit: usize, offset: usize) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("fields", SEARCH_FIELDS);
        url
    }

    /// Performs one rate-limited request and returns the raw body.
    async fn fetch_once(&self, url: &Url) -> Result<String, SearchError> {
        let _permit = self.rate_limiter.acquire().await;

        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::network(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(SearchError::from_status(
                url.as_str(),
                status.as_u16(),
                retry_after,
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::network(url.as_str(), &e))
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<SearchPage, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::invalid_request("search query is empty"));
        }
        let limit = limit.clamp(1, MAX_RESULTS_PER_REQUEST);
        let url = self.request_url(query, limit, offset);

        let mut attempt = 1;
        loop {
            let error = match self.fetch_once(&url).await {
                Ok(body) => {
                    return Ok(parse_search_page(url.as_str(), &body, offset).unwrap_or_else(
                        |e| {
                            warn!(error = %e, "treating malformed search response as empty");
                            SearchPage::empty(offset)
                        },
                    ));
                }
                Err(e) => e,
            };

            match self.retry_policy.should_retry(error.failure_type(), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    let delay = match error.retry_after() {
                        Some(server_delay) => {
                            self.rate_limiter.record_rate_limit(server_delay);
                            server_delay
                        }
                        None => delay,
                    };
                    warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "search request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(reason, attempt, "not retrying search request");
                    return Err(error);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

/// Parses a search response body.
///
/// Records that fail validation are skipped and logged; the rest of the page
/// is kept. `returned` counts every record the server sent, valid or not, so
/// pagination offsets stay aligned with the server.
///
/// # Errors
///
/// Returns [`SearchError::MalformedResponse`] if the body is empty or is not
/// a JSON object.
pub fn parse_search_page(url: &str, body: &str, requested_offset: usize) -> Result<SearchPage, SearchError> {
    if body.trim().is_empty() {
        return Err(SearchError::malformed(url, "empty response body"));
    }
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| SearchError::malformed(url, e.to_string()))?;

    let records = envelope.data.unwrap_or_default();
    let returned = records.len();
    let mut papers = Vec::with_capacity(returned);
    for (index, value) in records.into_iter().enumerate() {
        let validated = serde_json::from_value::<RawPaperRecord>(value)
            .map_err(|e| e.to_string())
            .and_then(|raw| PaperMetadata::try_from(raw).map_err(|e| e.to_string()));
        match validated {
            Ok(paper) => papers.push(paper),
            Err(reason) => warn!(index, reason, "skipping malformed search record"),
        }
    }

    Ok(SearchPage {
        total: envelope.total.unwrap_or(returned as u64),
        offset: envelope.offset.unwrap_or(requested_offset),
        returned,
        papers,
    })
}
