//! Integration tests for the download module.
//!
//! These tests verify the full download flow with mock HTTP servers.

mod support;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use paperscout_core::PaperMetadata;
use paperscout_core::download::{DownloadEngine, DownloadError, DownloaderConfig, PdfDownloader};
use paperscout_core::net::{RateLimiter, RetryPolicy};
use support::PDF_BYTES;
use support::mock_api::{asset_url, start_mock_api};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn downloader_in(dir: &Path) -> PdfDownloader {
    let mut config = DownloaderConfig::new(dir);
    config.retry_policy =
        RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50), 2.0)
            .without_jitter();
    PdfDownloader::new(config, Arc::new(RateLimiter::disabled())).unwrap()
}

fn paper_at(id: &str, title: &str, url: String) -> PaperMetadata {
    PaperMetadata::new(id, title)
        .with_author("Grace Hopper")
        .with_year(1952)
        .with_pdf_url(url)
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "A Compiler", asset_url(&server, "paper.pdf"));

    let attempt = downloader.download_with_retry(&paper).await;

    let pdf = attempt.result.unwrap();
    assert!(!pdf.reused);
    assert_eq!(attempt.attempts, 1);
    assert_eq!(pdf.path, downloader.target_path(&paper));
    assert_eq!(
        pdf.path.file_name().unwrap().to_string_lossy(),
        "Hopper1952_A_Compiler.pdf"
    );
    assert_eq!(std::fs::read(&pdf.path).unwrap(), PDF_BYTES);
    assert_eq!(dir_entries(temp_dir.path()), vec!["Hopper1952_A_Compiler.pdf"]);
}

#[tokio::test]
async fn test_download_accepts_pdf_signature_without_content_type() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Signature", asset_url(&server, "file"));

    assert!(downloader.download(&paper).await.is_some());
}

#[tokio::test]
async fn test_download_rejects_html_and_leaves_no_file() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("<html>Sign in to continue</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Paywalled", asset_url(&server, "paywall"));

    let attempt = downloader.download_with_retry(&paper).await;

    assert!(matches!(
        attempt.result,
        Err(DownloadError::ContentValidation { .. })
    ));
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_download_empty_body_is_rejected() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "application/pdf"))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Empty", asset_url(&server, "empty.pdf"));

    let attempt = downloader.download_with_retry(&paper).await;

    assert!(matches!(
        attempt.result,
        Err(DownloadError::ContentValidation { .. })
    ));
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_download_existing_file_makes_no_request() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF_BYTES.to_vec()))
        .expect(0)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Already Here", asset_url(&server, "p.pdf"));
    std::fs::write(downloader.target_path(&paper), b"%PDF-1.4 earlier run").unwrap();

    let first = downloader.download(&paper).await;
    let second = downloader.download(&paper).await;

    assert_eq!(first, second);
    assert_eq!(
        std::fs::read(downloader.target_path(&paper)).unwrap(),
        b"%PDF-1.4 earlier run"
    );
}

#[tokio::test]
async fn test_download_retries_transient_status() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Flaky Host", asset_url(&server, "flaky.pdf"));

    let attempt = downloader.download_with_retry(&paper).await;

    assert!(attempt.result.is_ok());
    assert_eq!(attempt.attempts, 2);
}

#[tokio::test]
async fn test_download_not_found_is_not_retried() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let downloader = downloader_in(temp_dir.path());
    let paper = paper_at("p1", "Gone", asset_url(&server, "gone.pdf"));

    let attempt = downloader.download_with_retry(&paper).await;

    assert!(matches!(
        attempt.result,
        Err(DownloadError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(attempt.attempts, 1);
}

#[tokio::test]
async fn test_engine_reports_mixed_batch() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ok.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let engine = DownloadEngine::new(2, Arc::new(downloader_in(temp_dir.path()))).unwrap();
    let papers = vec![
        paper_at("ok", "Works", asset_url(&server, "ok.pdf")),
        paper_at("missing", "Broken Link", asset_url(&server, "missing.pdf")),
        PaperMetadata::new("closed", "Closed Access"),
    ];

    let report = engine
        .download_all(&papers, Arc::new(AtomicBool::new(false)))
        .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert!(report.results["ok"].downloaded);
    assert!(report.results["ok"].filepath.as_ref().unwrap().exists());
    assert!(!report.results["missing"].downloaded);
    assert!(report.results["closed"].error.is_some());
}
