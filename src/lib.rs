//! Paperscout Core Library
//!
//! This library provides the core functionality for the paperscout tool,
//! which finds research papers on a topic, downloads their open-access PDFs
//! and breaks them into typed sections for analysis.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`net`] - Shared rate limiter, retry policy and HTTP client setup
//! - [`paper`] - Paper metadata and its validated wire schema
//! - [`search`] - Rate-limited Semantic Scholar search with pagination
//! - [`select`] - Paper ranking and optionally randomized selection
//! - [`download`] - Concurrent PDF downloads with content validation
//! - [`extract`] - Page-aware text extraction from PDFs and text files
//! - [`sections`] - Section detection state machine and section analysis
//! - [`text`] - Text quality metrics, citations, keywords and summaries
//! - [`store`] - JSON persistence of selections, reports and analyses
//! - [`pipeline`] - Retrieval and analysis pipelines built from the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod extract;
pub mod net;
pub mod paper;
pub mod pipeline;
pub mod search;
pub mod sections;
pub mod select;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use download::{DownloadEngine, DownloadError, DownloadReport, PdfDownloader};
pub use extract::{ExtractError, ExtractedText, TextExtractor};
pub use net::{FailureType, RateLimiter, RetryPolicy};
pub use paper::PaperMetadata;
pub use pipeline::{AnalysisPipeline, PipelineError, RetrievalOutcome, run_retrieval};
pub use search::{PaperSource, SearchError, SemanticScholarClient, search_paginated};
pub use sections::{Section, SectionDetector, SectionType, detect_sections};
pub use select::{SelectionOptions, select};
pub use text::{QualityMetrics, TextProcessor, extract_citations};
