//! End-to-end pipelines: retrieval (search, select, download) and analysis
//! (extract, detect sections, score).
//!
//! Each stage consumes the previous stage's output. Per-item failures are
//! logged and recorded; only persistence failures abort a pipeline.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::download::{DownloadEngine, DownloadReport, paper_filename};
use crate::extract::{ExtractError, ExtractedText, TextExtractor, extractor_for};
use crate::paper::PaperMetadata;
use crate::search::{PaperSource, search_paginated};
use crate::sections::{
    DEFAULT_MAX_INSIGHTS, KeyPhraseExtractor, SectionDetector, SectionDistribution,
    SectionDocument, SectionType, analyze_distribution, compare_across_papers,
    extract_key_insights, render_report,
};
use crate::select::{SelectionOptions, select};
use crate::store::{
    COMPARISON_FILE, DataLayout, StoreError, analysis_path, report_path, save_selected_papers,
    sections_path, write_json, write_text,
};
use crate::text::{Keyword, QualityMetrics, TextProcessor, TextStructure};

/// Errors that abort a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The search query was blank.
    #[error("search query must not be empty")]
    EmptyQuery,

    /// Text extraction failed for a file.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Writing results failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parameters of a retrieval run.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    /// Search query.
    pub query: String,
    /// Candidates fetched before selection.
    pub search_limit: usize,
    /// Selection settings.
    pub selection: SelectionOptions,
    /// RNG seed for randomized selection; entropy when `None`.
    pub seed: Option<u64>,
}

/// Result of a retrieval run that selected at least one paper.
#[derive(Debug, Clone)]
pub struct RetrievalSummary {
    /// Valid records returned by the search.
    pub found: usize,
    /// Selected papers in rank order.
    pub selected: Vec<PaperMetadata>,
    /// Download outcome.
    pub report: DownloadReport,
    /// Where the selection was written.
    pub selected_papers_path: PathBuf,
    /// Where the download report was written.
    pub download_report_path: PathBuf,
}

/// How a retrieval run ended.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// The search returned nothing.
    NoResults,
    /// Papers were found but none were selected.
    NothingSelected {
        /// Valid records returned by the search.
        found: usize,
    },
    /// Papers were selected and downloads attempted.
    Completed(Box<RetrievalSummary>),
}

/// Searches, selects and downloads papers for a query.
///
/// The selection is persisted before downloading starts, so an interrupted
/// run still records what was chosen.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyQuery`] for a blank query and
/// [`PipelineError::Store`] when results cannot be written.
#[instrument(skip(source, engine, layout, interrupted), fields(query = %request.query))]
pub async fn run_retrieval(
    source: &dyn PaperSource,
    engine: &DownloadEngine,
    layout: &DataLayout,
    request: &RetrievalRequest,
    interrupted: Arc<AtomicBool>,
) -> Result<RetrievalOutcome, PipelineError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(PipelineError::EmptyQuery);
    }

    let papers = search_paginated(source, query, request.search_limit, &interrupted).await;
    if papers.is_empty() {
        info!("search returned no papers");
        return Ok(RetrievalOutcome::NoResults);
    }
    let found = papers.len();

    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let selected = select(&papers, &request.selection, &mut rng);
    if selected.is_empty() {
        return Ok(RetrievalOutcome::NothingSelected { found });
    }
    info!(
        found,
        selected = selected.len(),
        with_pdf = selected.iter().filter(|p| p.has_open_access_pdf()).count(),
        "papers selected"
    );

    let selected_papers_path = layout.selected_papers_path();
    save_selected_papers(&selected_papers_path, &selected)?;

    let report = engine.download_all(&selected, interrupted).await;
    let download_report_path = layout.download_report_path();
    write_json(&download_report_path, &report)?;

    Ok(RetrievalOutcome::Completed(Box::new(RetrievalSummary {
        found,
        selected,
        report,
        selected_papers_path,
        download_report_path,
    })))
}

/// The `{stem}_analysis.json` record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Source file stem.
    pub paper_name: String,
    /// Section distribution.
    #[serde(flatten)]
    pub distribution: SectionDistribution,
    /// Words across all sections.
    pub total_words: usize,
    /// Insights from the abstract.
    pub key_insights: Vec<String>,
    /// Quality of the full text.
    pub quality_metrics: QualityMetrics,
    /// Citations found in the full text.
    pub citation_count: usize,
    /// Highest-scoring keywords of the full text.
    pub keywords: Vec<Keyword>,
    /// Extractive summary of the full text.
    pub summary: String,
    /// Line, sentence and paragraph statistics.
    pub structure_analysis: TextStructure,
    /// Plain-text section report, also written to `{stem}_report.txt`.
    pub text_report: String,
}

/// In-memory analysis of one paper.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperAnalysis {
    /// Sections with annotations.
    pub document: SectionDocument,
    /// Summary statistics.
    pub record: AnalysisRecord,
}

/// Files written for one analyzed paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedPaper {
    /// Source file stem.
    pub name: String,
    /// Sections detected.
    pub section_count: usize,
    /// `{stem}_sections.json`.
    pub sections_path: PathBuf,
    /// `{stem}_analysis.json`.
    pub analysis_path: PathBuf,
    /// `{stem}_report.txt`.
    pub report_path: PathBuf,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAnalysis {
    /// Source file.
    pub path: PathBuf,
    /// Reason.
    pub error: String,
}

/// Result of analyzing a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisBatch {
    /// Successfully analyzed papers.
    pub analyzed: Vec<AnalyzedPaper>,
    /// Files that failed.
    pub failed: Vec<FailedAnalysis>,
    /// Files skipped after an interrupt.
    pub not_started: usize,
    /// Cross-paper comparison, written when anything was analyzed.
    pub comparison_path: Option<PathBuf>,
}

/// Extract, detect and score pipeline writing into one output directory.
#[derive(Debug)]
pub struct AnalysisPipeline {
    output_dir: PathBuf,
    detector: SectionDetector,
    phrases: KeyPhraseExtractor,
    processor: TextProcessor,
    known_papers: HashMap<String, PaperMetadata>,
}

impl AnalysisPipeline {
    /// Creates a pipeline writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, processor: TextProcessor) -> Self {
        Self {
            output_dir: output_dir.into(),
            detector: SectionDetector::default(),
            phrases: KeyPhraseExtractor::new(),
            processor,
            known_papers: HashMap::new(),
        }
    }

    /// Uses a custom section detector.
    #[must_use]
    pub fn with_detector(mut self, detector: SectionDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Registers selected papers so their downloaded PDFs get title, authors
    /// and year in the section metadata.
    #[must_use]
    pub fn with_known_papers(mut self, papers: &[PaperMetadata]) -> Self {
        for paper in papers {
            let filename = paper_filename(paper);
            let stem = filename.trim_end_matches(".pdf").to_string();
            self.known_papers.insert(stem, paper.clone());
        }
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Analyzes already extracted text without touching the filesystem.
    #[must_use]
    #[instrument(skip(self, extracted), fields(pages = extracted.page_count()))]
    pub fn analyze_text(&self, name: &str, extracted: &ExtractedText) -> PaperAnalysis {
        let mut metadata = extracted.metadata.clone();
        if let Some(paper) = self.known_papers.get(name) {
            describe_paper(&mut metadata, paper);
        }

        let sections = self.detector.detect(&extracted.full_text);
        let document = SectionDocument::build(metadata, sections, &self.phrases);
        let text = self.processor.analyze(&extracted.full_text);

        let record = AnalysisRecord {
            paper_name: name.to_string(),
            distribution: analyze_distribution(document.plain_sections()),
            total_words: document.section_summary.total_words,
            key_insights: extract_key_insights(&document, SectionType::Abstract, DEFAULT_MAX_INSIGHTS),
            quality_metrics: text.quality_metrics,
            citation_count: text.citations.len(),
            keywords: text.keywords,
            summary: text.summary,
            structure_analysis: text.structure,
            text_report: render_report(&document),
        };
        PaperAnalysis { document, record }
    }

    /// Extracts and analyzes one file, writing its section and analysis files.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Extract`] if no text could be extracted and
    /// [`PipelineError::Store`] if the output cannot be written.
    #[instrument(skip(self, extractor), fields(path = %path.display()))]
    pub fn analyze_file(
        &self,
        path: &Path,
        extractor: &dyn TextExtractor,
    ) -> Result<(AnalyzedPaper, SectionDocument), PipelineError> {
        let extracted = extractor.extract(path)?;
        let name = file_stem(path);
        let analysis = self.analyze_text(&name, &extracted);

        let sections_file = sections_path(&self.output_dir, &name);
        let analysis_file = analysis_path(&self.output_dir, &name);
        let report_file = report_path(&self.output_dir, &name);
        write_json(&sections_file, &analysis.document)?;
        write_json(&analysis_file, &analysis.record)?;
        write_text(&report_file, &analysis.record.text_report)?;

        info!(
            sections = analysis.record.distribution.total_sections,
            words = analysis.record.total_words,
            "paper analyzed"
        );
        Ok((
            AnalyzedPaper {
                name,
                section_count: analysis.record.distribution.total_sections,
                sections_path: sections_file,
                analysis_path: analysis_file,
                report_path: report_file,
            },
            analysis.document,
        ))
    }

    /// Analyzes each file, then writes a cross-paper comparison.
    ///
    /// The extractor is chosen per file from its extension. A failing file is
    /// recorded and the rest continue. `interrupted` is checked between files.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] only if the comparison cannot be
    /// written; per-file failures land in [`AnalysisBatch::failed`].
    pub fn analyze_files(
        &self,
        paths: &[PathBuf],
        interrupted: &AtomicBool,
    ) -> Result<AnalysisBatch, PipelineError> {
        let mut batch = AnalysisBatch::default();
        let mut documents: Vec<(String, SectionDocument)> = Vec::new();

        for (index, path) in paths.iter().enumerate() {
            if interrupted.load(Ordering::SeqCst) {
                batch.not_started = paths.len() - index;
                info!(not_started = batch.not_started, "analysis interrupted");
                break;
            }
            let extractor = extractor_for(path);
            match self.analyze_file(path, extractor.as_ref()) {
                Ok((analyzed, document)) => {
                    documents.push((analyzed.name.clone(), document));
                    batch.analyzed.push(analyzed);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "analysis failed");
                    batch.failed.push(FailedAnalysis {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !documents.is_empty() {
            let comparison = compare_across_papers(
                documents
                    .iter()
                    .map(|(name, document)| (name.as_str(), document)),
            );
            let comparison_path = self.output_dir.join(COMPARISON_FILE);
            write_json(&comparison_path, &comparison)?;
            batch.comparison_path = Some(comparison_path);
        }
        Ok(batch)
    }
}

fn describe_paper(metadata: &mut BTreeMap<String, String>, paper: &PaperMetadata) {
    metadata.insert("paper_id".to_string(), paper.paper_id().to_string());
    metadata.insert("title".to_string(), paper.title.clone());
    if !paper.authors.is_empty() {
        let names: Vec<&str> = paper.authors.iter().map(|a| a.name.as_str()).collect();
        metadata.insert("authors".to_string(), names.join(", "));
    }
    if let Some(year) = paper.year {
        metadata.insert("year".to_string(), year.to_string());
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "paper".to_string(), |stem| stem.to_string_lossy().into_owned())
}
