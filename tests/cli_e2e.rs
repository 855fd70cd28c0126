//! End-to-end CLI tests for the paperscout binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::search_body;
use support::mock_api::{api_base_url, start_mock_api};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const PAPER_TEXT: &str = "--- Page 1 ---\nAbstract\nWe propose a compact index for scholarly search.\n\
--- Page 2 ---\n2. Methods\nWe build the index from citation graphs (Garfield, 1955).\n\
Conclusion\nThe index is small and fast.\n";

/// A command isolated from the user's config and API key.
fn paperscout(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("paperscout").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("SEMANTIC_SCHOLAR_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(config_home: &std::path::Path, contents: &str) {
    let config_dir = config_home.join("paperscout");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

fn toml_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    paperscout(tempdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("paperscout"))
        .stdout(predicate::str::contains("--max-papers"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    paperscout(tempdir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("paperscout"));
}

#[test]
fn test_binary_blank_topic_exits_one() {
    let tempdir = TempDir::new().unwrap();
    let assert = paperscout(tempdir.path()).arg("   ").assert().failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_missing_topic_exits_one() {
    let tempdir = TempDir::new().unwrap();
    let assert = paperscout(tempdir.path()).assert().failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_invalid_config_exits_one() {
    let tempdir = TempDir::new().unwrap();
    write_config(tempdir.path(), "[download]\nconcurrency = 0\n");
    let assert = paperscout(tempdir.path())
        .arg("topic")
        .assert()
        .failure()
        .stderr(predicate::str::contains("download.concurrency"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_rejects_out_of_range_concurrency() {
    let tempdir = TempDir::new().unwrap();
    paperscout(tempdir.path())
        .args(["topic", "--concurrency", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn test_binary_analyze_text_file() {
    let tempdir = TempDir::new().unwrap();
    let input = tempdir.path().join("index_paper.txt");
    std::fs::write(&input, PAPER_TEXT).unwrap();
    let out = tempdir.path().join("out");

    paperscout(tempdir.path())
        .arg("analyze")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .arg("--data-dir")
        .arg(tempdir.path().join("data"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed index_paper: 3 sections"));

    assert!(out.join("index_paper_sections.json").exists());
    assert!(out.join("index_paper_analysis.json").exists());
    assert!(out.join("cross_paper_comparison.json").exists());
}

#[test]
fn test_binary_analyze_partial_failure_exits_two() {
    let tempdir = TempDir::new().unwrap();
    let input = tempdir.path().join("ok.txt");
    std::fs::write(&input, PAPER_TEXT).unwrap();
    let out = tempdir.path().join("out");

    let assert = paperscout(tempdir.path())
        .arg("analyze")
        .arg(&input)
        .arg(tempdir.path().join("missing.pdf"))
        .arg("--output-dir")
        .arg(&out)
        .arg("-q")
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(2));
    assert!(out.join("ok_analysis.json").exists());
}

#[test]
fn test_binary_analyze_nothing_analyzed_exits_one() {
    let tempdir = TempDir::new().unwrap();
    let assert = paperscout(tempdir.path())
        .arg("analyze")
        .arg(tempdir.path().join("missing.pdf"))
        .arg("--output-dir")
        .arg(tempdir.path().join("out"))
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[tokio::test]
async fn test_binary_no_search_results_exits_one() {
    let Some(server) = start_mock_api().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(0, 0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let data_dir = tempdir.path().join("data");
    write_config(
        tempdir.path(),
        &format!(
            "[search]\nbase_url = \"{}\"\nrate_limit_ms = 0\n\n[paths]\ndata_dir = \"{}\"\n",
            api_base_url(&server),
            toml_path(&data_dir)
        ),
    );

    let assert = paperscout(tempdir.path())
        .arg("an obscure topic")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no papers found"));
    assert_eq!(assert.get_output().status.code(), Some(1));
    assert!(!data_dir.join("selected_papers.json").exists());
}
