//! Batch download engine: a bounded worker pool over selected papers.
//!
//! Each paper is downloaded in its own Tokio task, gated by a semaphore.
//! All tasks share one [`PdfDownloader`] and therefore one rate limiter, so
//! raising concurrency never raises the request rate above the ceiling.
//! One paper's failure never blocks the others.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::client::PdfDownloader;
use crate::paper::PaperMetadata;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 16;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Failure reason recorded for a paper whose download task panicked.
pub const TASK_PANICKED: &str = "download task panicked";

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Per-paper entry of a [`DownloadReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    /// Whether a PDF is available on disk.
    pub downloaded: bool,
    /// Where the PDF is stored.
    pub filepath: Option<PathBuf>,
    /// Failure reason when `downloaded` is false.
    pub error: Option<String>,
}

/// Result of a batch download.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    /// Per-paper outcome keyed by paper ID.
    pub results: BTreeMap<String, DownloadResult>,
    /// Papers processed.
    pub attempted: usize,
    /// Papers whose PDF is on disk (fresh or reused).
    pub succeeded: usize,
    /// Papers that could not be downloaded.
    pub failed: usize,
    /// Successful papers whose file already existed.
    pub reused: usize,
    /// Papers never started because the run was interrupted.
    pub not_started: usize,
    /// Retry attempts across all papers.
    pub retried: usize,
    /// Whether the run was interrupted.
    pub interrupted: bool,
}

/// Thread-safe counters updated by download tasks.
#[derive(Debug, Default)]
pub struct DownloadStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    reused: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful downloads.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Number of successes served from an existing file.
    #[must_use]
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::SeqCst)
    }

    /// Number of retry attempts made.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Total processed (succeeded + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }

    fn record_success(&self, reused: bool) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        if reused {
            self.reused.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_retries(&self, retries: usize) {
        self.retried.fetch_add(retries, Ordering::SeqCst);
    }
}

/// Concurrent downloader for a batch of papers.
#[derive(Debug)]
pub struct DownloadEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    downloader: Arc<PdfDownloader>,
}

impl DownloadEngine {
    /// Creates an engine running at most `concurrency` downloads at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] outside `1..=16`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use paperscout_core::download::{DownloadEngine, DownloaderConfig, PdfDownloader};
    /// use paperscout_core::net::RateLimiter;
    ///
    /// let downloader = PdfDownloader::new(
    ///     DownloaderConfig::new("./data/papers"),
    ///     Arc::new(RateLimiter::disabled()),
    /// ).unwrap();
    /// let engine = DownloadEngine::new(2, Arc::new(downloader)).unwrap();
    /// assert_eq!(engine.concurrency(), 2);
    /// ```
    #[instrument(level = "debug", skip(downloader))]
    pub fn new(concurrency: usize, downloader: Arc<PdfDownloader>) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            downloader,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Downloads every paper, returning a per-paper report.
    ///
    /// `interrupted` is checked before each paper starts; papers that never
    /// start are absent from `results` and counted in `not_started`.
    #[instrument(skip(self, papers, interrupted), fields(papers = papers.len()))]
    pub async fn download_all(
        &self,
        papers: &[PaperMetadata],
        interrupted: Arc<AtomicBool>,
    ) -> DownloadReport {
        let stats = Arc::new(DownloadStats::new());
        let mut handles = Vec::with_capacity(papers.len());
        let mut not_started = 0;

        info!(concurrency = self.concurrency, "starting downloads");

        for (index, paper) in papers.iter().enumerate() {
            if interrupted.load(Ordering::SeqCst) {
                not_started = papers.len() - index;
                info!(not_started, "interrupted, not starting remaining downloads");
                break;
            }

            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                warn!("download semaphore closed");
                not_started = papers.len() - index;
                break;
            };

            // Re-check after waiting for a free worker.
            if interrupted.load(Ordering::SeqCst) {
                not_started = papers.len() - index;
                info!(not_started, "interrupted, not starting remaining downloads");
                break;
            }

            let downloader = Arc::clone(&self.downloader);
            let stats = Arc::clone(&stats);
            let paper_id = paper.paper_id().to_string();
            let paper = paper.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let attempt = downloader.download_with_retry(&paper).await;
                stats.record_retries(attempt.attempts.saturating_sub(1) as usize);

                match attempt.result {
                    Ok(pdf) => {
                        stats.record_success(pdf.reused);
                        DownloadResult {
                            downloaded: true,
                            filepath: Some(pdf.path),
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(paper_id = paper.paper_id(), error = %e, "download failed");
                        stats.record_failure();
                        DownloadResult {
                            downloaded: false,
                            filepath: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            });
            handles.push((paper_id, handle));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut results = BTreeMap::new();
        for (paper_id, handle) in handles {
            let entry = join_download(&paper_id, handle, &stats).await;
            results.insert(paper_id, entry);
        }

        let report = DownloadReport {
            results,
            attempted: stats.total(),
            succeeded: stats.succeeded(),
            failed: stats.failed(),
            reused: stats.reused(),
            not_started,
            retried: stats.retried(),
            interrupted: not_started > 0,
        };
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            reused = report.reused,
            retried = report.retried,
            "downloads complete"
        );
        report
    }
}

/// Awaits one download task; a panicked task still gets a failed entry.
async fn join_download(
    paper_id: &str,
    handle: JoinHandle<DownloadResult>,
    stats: &DownloadStats,
) -> DownloadResult {
    match handle.await {
        Ok(entry) => entry,
        Err(e) => {
            warn!(paper_id, error = %e, "download task panicked");
            stats.record_failure();
            DownloadResult {
                downloaded: false,
                filepath: None,
                error: Some(TASK_PANICKED.to_string()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::DownloaderConfig;
    use crate::net::RateLimiter;

    fn downloader(dir: &std::path::Path) -> Arc<PdfDownloader> {
        Arc::new(
            PdfDownloader::new(DownloaderConfig::new(dir), Arc::new(RateLimiter::disabled()))
                .unwrap(),
        )
    }

    #[test]
    fn test_engine_new_valid_concurrency() {
        let dir = tempfile::TempDir::new().unwrap();
        for value in [1, DEFAULT_CONCURRENCY, 16] {
            let engine = DownloadEngine::new(value, downloader(dir.path())).unwrap();
            assert_eq!(engine.concurrency(), value);
        }
    }

    #[test]
    fn test_engine_new_invalid_concurrency() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            DownloadEngine::new(0, downloader(dir.path())),
            Err(EngineError::InvalidConcurrency { value: 0 })
        ));
        assert!(matches!(
            DownloadEngine::new(17, downloader(dir.path())),
            Err(EngineError::InvalidConcurrency { value: 17 })
        ));
    }

    #[test]
    fn test_download_stats_counts() {
        let stats = DownloadStats::new();
        stats.record_success(false);
        stats.record_success(true);
        stats.record_failure();
        stats.record_retries(2);

        assert_eq!(stats.succeeded(), 2);
        assert_eq!(stats.reused(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.retried(), 2);
        assert_eq!(stats.total(), 3);
    }

    #[tokio::test]
    async fn test_download_all_records_missing_pdf_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DownloadEngine::new(2, downloader(dir.path())).unwrap();
        let papers = vec![PaperMetadata::new("a", "A"), PaperMetadata::new("b", "B")];

        let report = engine
            .download_all(&papers, Arc::new(AtomicBool::new(false)))
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.succeeded, 0);
        let entry = &report.results["a"];
        assert!(!entry.downloaded);
        assert!(entry.error.as_deref().unwrap().contains("no open-access PDF"));
    }

    #[tokio::test]
    async fn test_join_download_records_panicked_task() {
        let stats = DownloadStats::new();
        let handle: JoinHandle<DownloadResult> = tokio::spawn(async {
            panic!("worker blew up");
        });

        let entry = join_download("p1", handle, &stats).await;

        assert!(!entry.downloaded);
        assert!(entry.filepath.is_none());
        assert_eq!(entry.error.as_deref(), Some(TASK_PANICKED));
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.total(), 1);
    }

    #[tokio::test]
    async fn test_join_download_passes_through_finished_task() {
        let stats = DownloadStats::new();
        let handle = tokio::spawn(async {
            DownloadResult {
                downloaded: true,
                filepath: Some(PathBuf::from("a.pdf")),
                error: None,
            }
        });

        let entry = join_download("a", handle, &stats).await;

        assert!(entry.downloaded);
        assert_eq!(stats.total(), 0);
    }

    #[tokio::test]
    async fn test_download_all_interrupted_starts_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DownloadEngine::new(1, downloader(dir.path())).unwrap();
        let papers = vec![PaperMetadata::new("a", "A")];

        let report = engine
            .download_all(&papers, Arc::new(AtomicBool::new(true)))
            .await;

        assert!(report.interrupted);
        assert_eq!(report.not_started, 1);
        assert!(report.results.is_empty());
        assert_eq!(report.attempted, 0);
    }
}
