//! Plain-text extraction from papers, with injected page markers.
//!
//! Extractors turn a file into [`ExtractedText`] whose `full_text` carries a
//! `--- Page N ---` line before each page. The section detector relies on
//! those lines to track page numbers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors raised by a [`TextExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being extracted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The PDF could not be parsed.
    #[error("failed to parse PDF {path}: {message}")]
    Pdf {
        /// File being extracted.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The file yielded no text at all (e.g. a scanned PDF).
    #[error("no extractable text in {path}")]
    Empty {
        /// File being extracted.
        path: PathBuf,
    },
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    /// 1-based page number.
    pub page_number: u32,
    /// Page text without the marker line.
    pub text: String,
    /// Whitespace-separated tokens in `text`.
    pub word_count: usize,
}

/// Output of a [`TextExtractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    /// All pages concatenated, each preceded by its page marker line.
    pub full_text: String,
    /// File-level facts such as `file_name`, `file_size`, `page_count`.
    pub metadata: BTreeMap<String, String>,
    /// Per-page text.
    pub page_texts: Vec<PageText>,
}

impl ExtractedText {
    /// Assembles extracted pages (in order, numbered from 1).
    #[must_use]
    pub fn from_pages<I>(pages: I, mut metadata: BTreeMap<String, String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut full_text = String::new();
        let mut page_texts = Vec::new();
        for (page_number, text) in (1u32..).zip(pages) {
            full_text.push_str(&page_marker(page_number));
            full_text.push_str(&text);
            page_texts.push(PageText {
                page_number,
                word_count: text.split_whitespace().count(),
                text,
            });
        }
        metadata.insert("page_count".to_string(), page_texts.len().to_string());
        Self {
            full_text,
            metadata,
            page_texts,
        }
    }

    /// Total pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }

    /// Whether no page carries any non-whitespace text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.page_texts.iter().all(|page| page.text.trim().is_empty())
    }
}

/// Marker line injected before the text of page `page_number`.
///
/// ```
/// assert_eq!(paperscout_core::extract::page_marker(3), "\n--- Page 3 ---\n");
/// ```
#[must_use]
pub fn page_marker(page_number: u32) -> String {
    format!("\n--- Page {page_number} ---\n")
}

/// Turns a document on disk into page-marked plain text.
pub trait TextExtractor: Send + Sync {
    /// Extracts text from `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the file cannot be read or parsed, or
    /// contains no text.
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError>;
}

/// PDF extractor backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let metadata = file_metadata(path)?;
        let document = lopdf::Document::load(path).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let pages = page_numbers.iter().map(|&number| {
            document.extract_text(&[number]).unwrap_or_else(|e| {
                warn!(page = number, error = %e, "failed to extract page text");
                String::new()
            })
        });

        let extracted = ExtractedText::from_pages(pages, metadata);
        if extracted.is_blank() {
            return Err(ExtractError::Empty {
                path: path.to_path_buf(),
            });
        }
        debug!(pages = extracted.page_count(), "extracted PDF text");
        Ok(extracted)
    }
}

/// Extractor for `.txt` files, optionally already carrying page markers.
///
/// Text before the first marker (or all text, when there are none) becomes page 1.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    marker: Regex,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            marker: crate::sections::default_page_marker(),
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let metadata = file_metadata(path)?;
        let raw = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let extracted = ExtractedText::from_pages(self.split_pages(&raw), metadata);
        if extracted.is_blank() {
            return Err(ExtractError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(extracted)
    }
}

impl PlainTextExtractor {
    fn split_pages(&self, raw: &str) -> Vec<String> {
        let mut pages = Vec::new();
        let mut current = String::new();
        let mut seen_marker = false;
        for line in raw.lines() {
            if self.marker.is_match(line) {
                if seen_marker || !current.trim().is_empty() {
                    pages.push(std::mem::take(&mut current));
                }
                seen_marker = true;
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        pages.push(current);
        pages
    }
}

/// Picks an extractor from the file extension (`.txt` or PDF otherwise).
#[must_use]
pub fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_text {
        Box::new(PlainTextExtractor::default())
    } else {
        Box::new(PdfTextExtractor)
    }
}

fn file_metadata(path: &Path) -> Result<BTreeMap<String, String>, ExtractError> {
    let meta = std::fs::metadata(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut metadata = BTreeMap::new();
    metadata.insert("file_size".to_string(), meta.len().to_string());
    metadata.insert(
        "file_name".to_string(),
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    Ok(metadata)
}
