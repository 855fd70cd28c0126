//! Exit code logic for the paperscout process.
//!
//! Single responsibility: map run outcomes to the process exit outcome.

use paperscout_core::download::DownloadReport;
use paperscout_core::pipeline::{AnalysisBatch, RetrievalOutcome};

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed item counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Empty searches and empty selections fail; download failures are partial
/// at worst, since the selection itself was produced.
pub(crate) fn retrieval_exit(outcome: &RetrievalOutcome) -> ProcessExit {
    match outcome {
        RetrievalOutcome::NoResults | RetrievalOutcome::NothingSelected { .. } => {
            ProcessExit::Failure
        }
        RetrievalOutcome::Completed(summary) => download_exit(&summary.report),
    }
}

fn download_exit(report: &DownloadReport) -> ProcessExit {
    match determine_exit_outcome(report.succeeded, report.failed) {
        ProcessExit::Failure => ProcessExit::Partial,
        other => other,
    }
}

pub(crate) fn analysis_exit(batch: &AnalysisBatch) -> ProcessExit {
    determine_exit_outcome(batch.analyzed.len(), batch.failed.len() + batch.not_started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperscout_core::pipeline::{AnalyzedPaper, FailedAnalysis};
    use std::path::PathBuf;

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
    }

    #[test]
    fn test_retrieval_without_papers_fails() {
        assert_eq!(retrieval_exit(&RetrievalOutcome::NoResults), ProcessExit::Failure);
        assert_eq!(
            retrieval_exit(&RetrievalOutcome::NothingSelected { found: 4 }),
            ProcessExit::Failure
        );
    }

    #[test]
    fn test_all_downloads_failed_is_partial() {
        let report = DownloadReport {
            attempted: 2,
            failed: 2,
            ..DownloadReport::default()
        };
        assert_eq!(download_exit(&report), ProcessExit::Partial);
    }

    #[test]
    fn test_analysis_with_nothing_analyzed_fails() {
        let mut batch = AnalysisBatch::default();
        batch.failed.push(FailedAnalysis {
            path: PathBuf::from("a.pdf"),
            error: "no text".to_string(),
        });
        assert_eq!(analysis_exit(&batch), ProcessExit::Failure);

        batch.analyzed.push(AnalyzedPaper {
            name: "b".to_string(),
            section_count: 3,
            sections_path: PathBuf::from("b_sections.json"),
            analysis_path: PathBuf::from("b_analysis.json"),
            report_path: PathBuf::from("b_report.txt"),
        });
        assert_eq!(analysis_exit(&batch), ProcessExit::Partial);
    }
}
