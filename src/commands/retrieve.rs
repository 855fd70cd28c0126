//! Default command: search, select and download papers for a topic.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use paperscout_core::download::{DownloadEngine, PdfDownloader};
use paperscout_core::net::RateLimiter;
use paperscout_core::pipeline::{RetrievalOutcome, RetrievalRequest, RetrievalSummary, run_retrieval};
use paperscout_core::search::SemanticScholarClient;
use tracing::{debug, error, info};

use crate::ProcessExit;
use crate::app::config_runtime::RetrieveSettings;
use crate::app::{exit_handler, progress_manager, terminal};

pub(crate) async fn run_retrieve_command(
    settings: &RetrieveSettings,
    quiet: bool,
    interrupted: Arc<AtomicBool>,
) -> Result<ProcessExit> {
    if settings.topic.is_empty() {
        error!("research topic must not be empty");
        return Ok(ProcessExit::Failure);
    }

    let rate_limiter = if settings.rate_limit_ms == 0 {
        debug!("rate limiting disabled");
        Arc::new(RateLimiter::disabled())
    } else {
        debug!(rate_limit_ms = settings.rate_limit_ms, "rate limiting enabled");
        Arc::new(RateLimiter::new(Duration::from_millis(settings.rate_limit_ms)))
    };

    let client = SemanticScholarClient::new(settings.search.clone(), Arc::clone(&rate_limiter))
        .context("failed to create search client")?;
    let downloader = PdfDownloader::new(settings.download.clone(), rate_limiter)
        .context("failed to create PDF downloader")?;
    let engine = DownloadEngine::new(settings.concurrency, Arc::new(downloader))?;

    let request = RetrievalRequest {
        query: settings.topic.clone(),
        search_limit: settings.search_limit,
        selection: settings.selection,
        seed: settings.seed,
    };

    info!(topic = %settings.topic, max_papers = settings.selection.max_papers, "retrieving papers");
    let use_spinner = terminal::should_use_spinner(
        std::io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let (handle, stop) = progress_manager::spawn_progress_ui(
        use_spinner,
        format!("Retrieving papers on \"{}\"", settings.topic),
    );
    let outcome = run_retrieval(&client, &engine, &settings.layout, &request, interrupted).await;
    progress_manager::finish_progress_ui(handle, &stop).await;
    let outcome = outcome.context("retrieval failed")?;

    match &outcome {
        RetrievalOutcome::NoResults => {
            error!(topic = %settings.topic, "no papers found for topic");
        }
        RetrievalOutcome::NothingSelected { found } => {
            error!(found, "no papers could be selected");
        }
        RetrievalOutcome::Completed(summary) => {
            if !quiet {
                print_summary(summary);
            }
        }
    }
    Ok(exit_handler::retrieval_exit(&outcome))
}

fn print_summary(summary: &RetrievalSummary) {
    println!(
        "Found {} papers, selected {}:",
        summary.found,
        summary.selected.len()
    );
    for (index, paper) in summary.selected.iter().enumerate() {
        let year = paper
            .year
            .map_or_else(|| "n.d.".to_string(), |year| year.to_string());
        let status = match summary.report.results.get(paper.paper_id()) {
            Some(result) if result.downloaded => "downloaded",
            Some(_) => "failed",
            None if paper.has_open_access_pdf() => "not started",
            None => "no open-access PDF",
        };
        println!(
            "  {}. {} ({year}), {} citations [{status}]",
            index + 1,
            paper.title,
            paper.citation_count
        );
    }

    let report = &summary.report;
    println!(
        "Downloaded {} of {} PDFs ({} already present, {} failed)",
        report.succeeded, report.attempted, report.reused, report.failed
    );
    if report.interrupted {
        println!("Interrupted: {} downloads not started", report.not_started);
    }
    println!("Selection saved to {}", summary.selected_papers_path.display());
    println!("Download report saved to {}", summary.download_report_path.display());
}
