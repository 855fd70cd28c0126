//! Scholarly search: the [`PaperSource`] seam, the Semantic Scholar client,
//! and offset-based pagination.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//! use paperscout_core::net::RateLimiter;
//! use paperscout_core::search::{SearchClientConfig, SemanticScholarClient, search_paginated};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1100)));
//! let client = SemanticScholarClient::new(SearchClientConfig::default(), limiter)?;
//! let stop = AtomicBool::new(false);
//! let papers = search_paginated(&client, "protein folding", 150, &stop).await;
//! println!("retrieved {} papers", papers.len());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::paper::PaperMetadata;

mod client;
mod error;

pub use client::{
    SEARCH_FIELDS, SEMANTIC_SCHOLAR_API_URL, SearchClientConfig, SemanticScholarClient,
    parse_search_page,
};
pub use error::SearchError;

/// Server-side cap on records per request.
pub const MAX_RESULTS_PER_REQUEST: usize = 100;

/// Default number of candidates retrieved before selection.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total matches the server reports for the query.
    pub total: u64,
    /// Offset of this page.
    pub offset: usize,
    /// Records the server sent, including ones rejected during validation.
    pub returned: usize,
    /// Validated records, in relevance order.
    pub papers: Vec<PaperMetadata>,
}

impl SearchPage {
    /// An empty page at `offset`.
    #[must_use]
    pub fn empty(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Builds a page whose records all passed validation.
    #[must_use]
    pub fn from_papers(total: u64, offset: usize, papers: Vec<PaperMetadata>) -> Self {
        Self {
            total,
            offset,
            returned: papers.len(),
            papers,
        }
    }
}

/// A source of bibliographic search results.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetches one page of results.
    ///
    /// `limit` is at most [`MAX_RESULTS_PER_REQUEST`]; larger values are clamped.
    /// An empty or unparseable response yields an empty page, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::TransientNetwork`] once retries are exhausted and
    /// [`SearchError::PermanentRequest`] for requests that can never succeed.
    async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<SearchPage, SearchError>;
}

/// Retrieves up to `total_limit` records by paging through `source`.
///
/// Stops on a short or empty page, when the limit is reached, when a page
/// ultimately fails (keeping what was already retrieved), or when `interrupted`
/// is set between pages.
#[instrument(skip(source, interrupted))]
pub async fn search_paginated<S>(
    source: &S,
    query: &str,
    total_limit: usize,
    interrupted: &AtomicBool,
) -> Vec<PaperMetadata>
where
    S: PaperSource + ?Sized,
{
    let mut papers: Vec<PaperMetadata> = Vec::new();
    let mut offset = 0;

    while papers.len() < total_limit {
        if interrupted.load(Ordering::SeqCst) {
            info!(retrieved = papers.len(), "search interrupted, keeping partial results");
            break;
        }

        let requested = (total_limit - papers.len()).min(MAX_RESULTS_PER_REQUEST);
        match source.search(query, requested, offset).await {
            Ok(page) => {
                debug!(
                    offset,
                    requested,
                    returned = page.returned,
                    valid = page.papers.len(),
                    total = page.total,
                    "received search page"
                );
                offset += page.returned;
                papers.extend(page.papers);
                if page.returned < requested {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, retrieved = papers.len(), "search page failed, keeping partial results");
                break;
            }
        }
    }

    papers.truncate(total_limit);
    info!(count = papers.len(), "search complete");
    papers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serves a fixed corpus and records each request.
    struct FixedSource {
        corpus: Vec<PaperMetadata>,
        fail_at_offset: Option<usize>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl FixedSource {
        fn new(count: usize) -> Self {
            Self {
                corpus: (0..count)
                    .map(|i| PaperMetadata::new(format!("p{i}"), format!("Paper {i}")))
                    .collect(),
                fail_at_offset: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaperSource for FixedSource {
        async fn search(&self, _query: &str, limit: usize, offset: usize) -> Result<SearchPage, SearchError> {
            self.calls.lock().unwrap().push((limit, offset));
            if self.fail_at_offset == Some(offset) {
                return Err(SearchError::from_status("mock", 503, None));
            }
            let page: Vec<PaperMetadata> = self
                .corpus
                .iter()
                .skip(offset)
                .take(limit.min(MAX_RESULTS_PER_REQUEST))
                .cloned()
                .collect();
            Ok(SearchPage::from_papers(self.corpus.len() as u64, offset, page))
        }
    }

    #[tokio::test]
    async fn test_paginates_in_hundred_record_pages() {
        let source = FixedSource::new(250);
        let stop = AtomicBool::new(false);

        let papers = search_paginated(&source, "q", 250, &stop).await;

        assert_eq!(papers.len(), 250);
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec![(100, 0), (100, 100), (50, 200)]
        );
        assert_eq!(papers[249].paper_id(), "p249");
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let source = FixedSource::new(130);
        let stop = AtomicBool::new(false);

        let papers = search_paginated(&source, "q", 300, &stop).await;

        assert_eq!(papers.len(), 130);
        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_results() {
        let mut source = FixedSource::new(300);
        source.fail_at_offset = Some(100);
        let stop = AtomicBool::new(false);

        let papers = search_paginated(&source, "q", 300, &stop).await;

        assert_eq!(papers.len(), 100);
    }

    #[tokio::test]
    async fn test_zero_limit_makes_no_requests() {
        let source = FixedSource::new(10);
        let stop = AtomicBool::new(false);

        assert!(search_paginated(&source, "q", 0, &stop).await.is_empty());
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_interrupted_before_first_page() {
        let source = FixedSource::new(10);
        let stop = AtomicBool::new(true);

        assert!(search_paginated(&source, "q", 10, &stop).await.is_empty());
        assert!(source.calls.lock().unwrap().is_empty());
    }
}
