//! JSON persistence for selections, download reports and analysis output.
//!
//! All files are pretty-printed UTF-8 JSON written through a temporary file
//! and renamed into place, so a crash never leaves a truncated file behind.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::paper::PaperMetadata;

/// Default root for all persisted state.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Subdirectory of the data dir holding PDFs.
pub const PAPERS_SUBDIR: &str = "papers";

/// Subdirectory of the data dir holding analysis output.
pub const ANALYSIS_SUBDIR: &str = "section_analysis";

/// Selected papers, in rank order.
pub const SELECTED_PAPERS_FILE: &str = "selected_papers.json";

/// Per-paper download outcome.
pub const DOWNLOAD_REPORT_FILE: &str = "download_report.json";

/// Cross-paper comparison.
pub const COMPARISON_FILE: &str = "cross_paper_comparison.json";

/// Errors raised while reading or writing persisted files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// (De)serialization failure.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A selected paper as persisted, with resolved PDF facts alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPaperRecord {
    /// The paper.
    #[serde(flatten)]
    pub paper: PaperMetadata,
    /// Whether an open-access PDF URL was available.
    pub has_open_access_pdf: bool,
    /// The PDF URL, if any.
    pub pdf_url: Option<String>,
}

impl From<&PaperMetadata> for SelectedPaperRecord {
    fn from(paper: &PaperMetadata) -> Self {
        Self {
            has_open_access_pdf: paper.has_open_access_pdf(),
            pdf_url: paper.pdf_url().map(str::to_string),
            paper: paper.clone(),
        }
    }
}

/// Layout of the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where PDFs are downloaded.
    #[must_use]
    pub fn papers_dir(&self) -> PathBuf {
        self.root.join(PAPERS_SUBDIR)
    }

    /// Default analysis output directory.
    #[must_use]
    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join(ANALYSIS_SUBDIR)
    }

    /// Path of the selected-papers file.
    #[must_use]
    pub fn selected_papers_path(&self) -> PathBuf {
        self.root.join(SELECTED_PAPERS_FILE)
    }

    /// Path of the download report.
    #[must_use]
    pub fn download_report_path(&self) -> PathBuf {
        self.root.join(DOWNLOAD_REPORT_FILE)
    }
}

/// `{dir}/{stem}_sections.json`.
#[must_use]
pub fn sections_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_sections.json"))
}

/// `{dir}/{stem}_analysis.json`.
#[must_use]
pub fn analysis_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_analysis.json"))
}

/// `{dir}/{stem}_report.txt`.
#[must_use]
pub fn report_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_report.txt"))
}

/// Writes `value` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreError`] on I/O or serialization failure; the target is
/// left untouched in that case.
#[instrument(skip(value), fields(path = %path.display()))]
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    write_through_temp(path, |writer, tmp_path| {
        serde_json::to_writer_pretty(&mut *writer, value).map_err(|e| StoreError::json(path, e))?;
        writer.write_all(b"\n").map_err(|e| StoreError::io(tmp_path, e))
    })?;
    debug!("wrote JSON file");
    Ok(())
}

/// Writes `text` as UTF-8, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreError`] on I/O failure; the target is left untouched in
/// that case.
#[instrument(skip(text), fields(path = %path.display()))]
pub fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    write_through_temp(path, |writer, tmp_path| {
        writer
            .write_all(text.as_bytes())
            .map_err(|e| StoreError::io(tmp_path, e))
    })?;
    debug!("wrote text file");
    Ok(())
}

/// Runs `fill` against `<path>.tmp`, then renames it over `path`.
fn write_through_temp<F>(path: &Path, fill: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BufWriter<fs::File>, &Path) -> Result<(), StoreError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| {
        let file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        fill(&mut writer, &tmp_path)?;
        writer.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(writer);
        fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Reads a JSON file into `T`.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be opened or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(path, e))
}

/// Persists the selection in rank order.
///
/// # Errors
///
/// See [`write_json`].
pub fn save_selected_papers(path: &Path, papers: &[PaperMetadata]) -> Result<(), StoreError> {
    let records: Vec<SelectedPaperRecord> = papers.iter().map(SelectedPaperRecord::from).collect();
    write_json(path, &records)
}

/// Loads a selection written by [`save_selected_papers`].
///
/// # Errors
///
/// See [`read_json`].
pub fn load_selected_papers(path: &Path) -> Result<Vec<PaperMetadata>, StoreError> {
    let records: Vec<SelectedPaperRecord> = read_json(path)?;
    Ok(records.into_iter().map(|record| record.paper).collect())
}
