//! Open-access PDF retrieval for selected papers.
//!
//! # Features
//!
//! - Deterministic `{lastName}{year}_{title}.pdf` filenames; an existing file
//!   is reused without any request
//! - Streaming downloads written to a `.part` file and renamed on success
//! - Content validation: declared `pdf` content type or a `%PDF` signature
//! - Retry with exponential backoff for transient failures
//! - Bounded worker pool sharing one rate limiter
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//! use paperscout_core::PaperMetadata;
//! use paperscout_core::download::{DownloadEngine, DownloaderConfig, PdfDownloader};
//! use paperscout_core::net::RateLimiter;
//!
//! # async fn example(papers: Vec<PaperMetadata>) -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = PdfDownloader::new(
//!     DownloaderConfig::new("./data/papers"),
//!     Arc::new(RateLimiter::new(Duration::from_millis(1100))),
//! )?;
//! let engine = DownloadEngine::new(2, Arc::new(downloader))?;
//! let report = engine.download_all(&papers, Arc::new(AtomicBool::new(false))).await;
//! println!("{} of {} downloaded", report.succeeded, report.attempted);
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod filename;

pub use client::{DownloadAttempt, DownloadedPdf, DownloaderConfig, PdfDownloader};
pub use engine::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadReport, DownloadResult, DownloadStats, EngineError,
    TASK_PANICKED,
};
pub use error::{DownloadError, classify_error};
pub use filename::{MAX_AUTHOR_CHARS, MAX_TITLE_CHARS, paper_filename, sanitize_component};
