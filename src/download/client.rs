//! Streaming PDF downloader with content validation and retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{DownloadError, classify_error};
use super::filename::paper_filename;
use crate::net::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS};
use crate::net::{RateLimiter, RetryDecision, RetryPolicy, build_client, parse_retry_after};
use crate::paper::PaperMetadata;

/// Leading bytes of every PDF file.
const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Suffix for in-progress downloads.
const PARTIAL_SUFFIX: &str = "part";

/// Settings for [`PdfDownloader`].
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Directory PDFs are written to (created on demand).
    pub download_dir: PathBuf,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub read_timeout: Duration,
    /// Retry behavior for transient failures.
    pub retry_policy: RetryPolicy,
}

impl DownloaderConfig {
    /// Default timeouts and retries for `download_dir`.
    #[must_use]
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DOWNLOAD_READ_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Outcome of one download including how many attempts it took.
#[derive(Debug)]
pub struct DownloadAttempt {
    /// Final result.
    pub result: Result<DownloadedPdf, DownloadError>,
    /// Number of network attempts made (0 when no request was needed).
    pub attempts: u32,
}

/// A PDF available on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPdf {
    /// Location of the file.
    pub path: PathBuf,
    /// Whether the file already existed and no request was made.
    pub reused: bool,
}

/// Downloads open-access PDFs for papers.
///
/// The client is reused across downloads for connection pooling. Every
/// request goes through the shared [`RateLimiter`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use paperscout_core::PaperMetadata;
/// use paperscout_core::download::{DownloaderConfig, PdfDownloader};
/// use paperscout_core::net::RateLimiter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1100)));
/// let downloader = PdfDownloader::new(DownloaderConfig::new("./data/papers"), limiter)?;
/// let paper = PaperMetadata::new("id", "A Paper").with_pdf_url("https://arxiv.org/pdf/1706.03762");
/// if let Some(path) = downloader.download(&paper).await {
///     println!("saved {}", path.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    client: Client,
    download_dir: PathBuf,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
}

impl PdfDownloader {
    /// Creates a downloader.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: DownloaderConfig, rate_limiter: Arc<RateLimiter>) -> Result<Self, DownloadError> {
        let client = build_client(config.connect_timeout, config.read_timeout)
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self {
            client,
            download_dir: config.download_dir,
            rate_limiter,
            retry_policy: config.retry_policy,
        })
    }

    /// Directory PDFs are written to.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Path the paper's PDF is (or would be) stored at.
    #[must_use]
    pub fn target_path(&self, paper: &PaperMetadata) -> PathBuf {
        self.download_dir.join(paper_filename(paper))
    }

    /// Downloads a paper's PDF, returning its path or `None` on any failure.
    ///
    /// Failures are logged; use [`try_download`](Self::try_download) for the reason.
    #[instrument(skip(self, paper), fields(paper_id = paper.paper_id()))]
    pub async fn download(&self, paper: &PaperMetadata) -> Option<PathBuf> {
        match self.try_download(paper).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "download failed");
                None
            }
        }
    }

    /// Downloads a paper's PDF.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] describing why no PDF could be stored.
    pub async fn try_download(&self, paper: &PaperMetadata) -> Result<PathBuf, DownloadError> {
        self.download_with_retry(paper).await.result.map(|pdf| pdf.path)
    }

    /// Downloads a paper's PDF, retrying transient failures.
    ///
    /// If the target file already exists no request is made.
    #[instrument(skip(self, paper), fields(paper_id = paper.paper_id()))]
    pub async fn download_with_retry(&self, paper: &PaperMetadata) -> DownloadAttempt {
        let Some(url) = paper.pdf_url() else {
            return DownloadAttempt {
                result: Err(DownloadError::no_open_access_pdf(paper.paper_id())),
                attempts: 0,
            };
        };

        let path = self.target_path(paper);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path.display(), "PDF already present, skipping request");
            return DownloadAttempt {
                result: Ok(DownloadedPdf { path, reused: true }),
                attempts: 0,
            };
        }

        if let Err(e) = validate_url(url) {
            return DownloadAttempt {
                result: Err(e),
                attempts: 0,
            };
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.download_dir).await {
            return DownloadAttempt {
                result: Err(DownloadError::io(self.download_dir.clone(), e)),
                attempts: 0,
            };
        }

        let mut attempt = 1;
        loop {
            let error = match self.fetch_to_file(url, &path).await {
                Ok(bytes) => {
                    info!(path = %path.display(), bytes, attempt, "download complete");
                    return DownloadAttempt {
                        result: Ok(DownloadedPdf {
                            path,
                            reused: false,
                        }),
                        attempts: attempt,
                    };
                }
                Err(e) => e,
            };

            match self.retry_policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    let delay = match &error {
                        DownloadError::HttpStatus {
                            retry_after: Some(value),
                            ..
                        } => match parse_retry_after(value) {
                            Some(server_delay) => {
                                self.rate_limiter.record_rate_limit(server_delay);
                                server_delay
                            }
                            None => delay,
                        },
                        _ => delay,
                    };
                    warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(reason, attempt, "not retrying download");
                    return DownloadAttempt {
                        result: Err(error),
                        attempts: attempt,
                    };
                }
            }
        }
    }

    /// One rate-limited GET streamed into `path`; returns bytes written.
    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let _permit = self.rate_limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(DownloadError::http_status(url, status.as_u16(), retry_after));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let mut stream = response.bytes_stream();
        let mut head: Vec<u8> = Vec::new();
        while head.len() < PDF_SIGNATURE.len() {
            match stream.next().await {
                Some(chunk) => head.extend_from_slice(&chunk.map_err(|e| DownloadError::network(url, e))?),
                None => break,
            }
        }

        let declared_pdf = content_type.as_deref().is_some_and(|ct| ct.contains("pdf"));
        if head.is_empty() || !(declared_pdf || head.starts_with(PDF_SIGNATURE)) {
            return Err(DownloadError::content_validation(url, content_type.as_deref()));
        }

        let partial = partial_path(path);
        let written = write_stream(&partial, &head, &mut stream, url).await;
        let written = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %partial.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(DownloadError::io(path, e));
        }
        Ok(written)
    }
}

fn validate_url(url: &str) -> Result<(), DownloadError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(DownloadError::invalid_url(url)),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Writes `head` followed by the rest of `stream` to `path`.
async fn write_stream<S, B>(
    path: &Path,
    head: &[u8],
    stream: &mut S,
    url: &str,
) -> Result<u64, DownloadError>
where
    S: futures_util::Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
{
    let file = File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(head)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut bytes_written = head.len() as u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;
        let chunk = chunk.as_ref();
        writer
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}
