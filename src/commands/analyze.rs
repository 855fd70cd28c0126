//! `analyze` command: section detection and scoring over local files.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use paperscout_core::PaperMetadata;
use paperscout_core::pipeline::{AnalysisBatch, AnalysisPipeline};
use paperscout_core::store::{DataLayout, load_selected_papers};
use paperscout_core::text::TextProcessor;
use tracing::{debug, error, info, warn};

use crate::ProcessExit;
use crate::app::config_runtime::AnalyzeSettings;
use crate::app::{exit_handler, progress_manager, terminal};

pub(crate) async fn run_analyze_command(
    settings: &AnalyzeSettings,
    quiet: bool,
    interrupted: Arc<AtomicBool>,
) -> Result<ProcessExit> {
    let known_papers = load_known_papers(&settings.layout);
    let pipeline = AnalysisPipeline::new(
        settings.output_dir.clone(),
        TextProcessor::new(settings.dictionary.clone()),
    )
    .with_known_papers(&known_papers);

    info!(
        files = settings.files.len(),
        output_dir = %settings.output_dir.display(),
        "analyzing papers"
    );
    let use_spinner = terminal::should_use_spinner(
        std::io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let (handle, stop) = progress_manager::spawn_progress_ui(
        use_spinner,
        format!("Analyzing {} files", settings.files.len()),
    );

    let files = settings.files.clone();
    let joined =
        tokio::task::spawn_blocking(move || pipeline.analyze_files(&files, &interrupted)).await;
    progress_manager::finish_progress_ui(handle, &stop).await;
    let batch = joined.context("analysis task panicked")??;

    if batch.analyzed.is_empty() {
        error!(failed = batch.failed.len(), "no file could be analyzed");
    }
    if !quiet {
        print_summary(&batch);
    }
    Ok(exit_handler::analysis_exit(&batch))
}

/// Selected papers from a previous run, used to label downloaded PDFs.
fn load_known_papers(layout: &DataLayout) -> Vec<PaperMetadata> {
    let path = layout.selected_papers_path();
    if !path.exists() {
        debug!(path = %path.display(), "no selection file, analyzing without paper metadata");
        return Vec::new();
    }
    match load_selected_papers(&path) {
        Ok(papers) => papers,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable selection file");
            Vec::new()
        }
    }
}

fn print_summary(batch: &AnalysisBatch) {
    for paper in &batch.analyzed {
        println!(
            "Analyzed {}: {} sections -> {}",
            paper.name,
            paper.section_count,
            paper.analysis_path.display()
        );
    }
    for failure in &batch.failed {
        println!("Failed {}: {}", failure.path.display(), failure.error);
    }
    if batch.not_started > 0 {
        println!("Interrupted: {} files not analyzed", batch.not_started);
    }
    if let Some(path) = &batch.comparison_path {
        println!("Cross-paper comparison saved to {}", path.display());
    }
}
