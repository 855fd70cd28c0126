//! Effective settings: CLI flag, then config file, then built-in default.

use std::path::PathBuf;
use std::time::Duration;

use paperscout_core::download::{DEFAULT_CONCURRENCY, DownloaderConfig};
use paperscout_core::net::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_RATE_LIMIT_MS, DOWNLOAD_READ_TIMEOUT_SECS,
    SEARCH_READ_TIMEOUT_SECS,
};
use paperscout_core::net::{DEFAULT_MAX_RETRIES, RetryPolicy};
use paperscout_core::search::{DEFAULT_SEARCH_LIMIT, SEMANTIC_SCHOLAR_API_URL, SearchClientConfig};
use paperscout_core::select::{
    DEFAULT_DIVERSITY_FACTOR, DEFAULT_MAX_PAPERS, MAX_PAPERS_UPPER_LIMIT, SelectionOptions,
};
use paperscout_core::store::{DEFAULT_DATA_DIR, DataLayout};
use paperscout_core::text::TermDictionary;
use tracing::warn;

use crate::app_config::LoadedConfig;
use crate::cli::{AnalyzeArgs, CommonArgs, RetrieveArgs};

/// Everything the default run needs, resolved.
#[derive(Debug, Clone)]
pub(crate) struct RetrieveSettings {
    pub(crate) topic: String,
    pub(crate) layout: DataLayout,
    pub(crate) search_limit: usize,
    pub(crate) selection: SelectionOptions,
    pub(crate) seed: Option<u64>,
    pub(crate) rate_limit_ms: u64,
    pub(crate) concurrency: usize,
    pub(crate) search: SearchClientConfig,
    pub(crate) download: DownloaderConfig,
}

/// Everything `analyze` needs, resolved.
#[derive(Debug, Clone)]
pub(crate) struct AnalyzeSettings {
    pub(crate) files: Vec<PathBuf>,
    pub(crate) layout: DataLayout,
    pub(crate) output_dir: PathBuf,
    pub(crate) dictionary: TermDictionary,
}

pub(crate) fn resolve_retrieve_settings(
    args: &RetrieveArgs,
    loaded: &LoadedConfig,
) -> RetrieveSettings {
    let file = &loaded.config;
    let layout = DataLayout::new(resolve_data_dir(args.data_dir.as_ref(), loaded));

    let max_papers = clamp_max_papers(
        args.max_papers
            .or(file.selection.max_papers)
            .unwrap_or(DEFAULT_MAX_PAPERS),
    );
    let diversity_factor = clamp_diversity(
        args.diversity
            .or(file.selection.diversity)
            .unwrap_or(DEFAULT_DIVERSITY_FACTOR),
    );
    let randomize = args.randomize || file.selection.randomize.unwrap_or(false);

    let max_attempts = args
        .max_retries
        .map(u32::from)
        .or(file.search.max_retries)
        .unwrap_or(DEFAULT_MAX_RETRIES);
    let retry_policy = RetryPolicy::with_max_attempts(max_attempts);

    let search = SearchClientConfig {
        base_url: file
            .search
            .base_url
            .clone()
            .unwrap_or_else(|| SEMANTIC_SCHOLAR_API_URL.to_string()),
        api_key: loaded.api_key().map(str::to_string),
        connect_timeout: secs(file.search.connect_timeout_secs, CONNECT_TIMEOUT_SECS),
        read_timeout: secs(file.search.read_timeout_secs, SEARCH_READ_TIMEOUT_SECS),
        retry_policy: retry_policy.clone(),
    };

    let mut download = DownloaderConfig::new(layout.papers_dir());
    download.connect_timeout = secs(file.download.connect_timeout_secs, CONNECT_TIMEOUT_SECS);
    download.read_timeout = secs(file.download.read_timeout_secs, DOWNLOAD_READ_TIMEOUT_SECS);
    download.retry_policy = retry_policy;

    RetrieveSettings {
        topic: args.topic.as_deref().map(str::trim).unwrap_or_default().to_string(),
        layout,
        search_limit: args
            .search_limit
            .map(usize::from)
            .or(file.search.initial_limit)
            .unwrap_or(DEFAULT_SEARCH_LIMIT),
        selection: SelectionOptions {
            max_papers,
            randomize,
            diversity_factor,
        },
        seed: args.seed,
        rate_limit_ms: args
            .rate_limit
            .or(file.search.rate_limit_ms)
            .unwrap_or(DEFAULT_RATE_LIMIT_MS),
        concurrency: args
            .concurrency
            .map(usize::from)
            .or(file.download.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY),
        search,
        download,
    }
}

pub(crate) fn resolve_analyze_settings(args: &AnalyzeArgs, loaded: &LoadedConfig) -> AnalyzeSettings {
    let layout = DataLayout::new(resolve_data_dir(args.data_dir.as_ref(), loaded));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| layout.analysis_dir());
    let dictionary = loaded
        .config
        .quality
        .terms
        .clone()
        .map(TermDictionary::new)
        .unwrap_or_default();
    AnalyzeSettings {
        files: args.files.clone(),
        layout,
        output_dir,
        dictionary,
    }
}

fn resolve_data_dir(flag: Option<&PathBuf>, loaded: &LoadedConfig) -> PathBuf {
    flag.cloned()
        .or_else(|| loaded.config.paths.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn secs(configured: Option<u64>, default: u64) -> Duration {
    Duration::from_secs(configured.unwrap_or(default))
}

pub(crate) fn clamp_max_papers(requested: usize) -> usize {
    let used = requested.clamp(1, MAX_PAPERS_UPPER_LIMIT);
    if used != requested {
        warn!(requested, used, "max papers out of range (1-{MAX_PAPERS_UPPER_LIMIT}), clamping");
    }
    used
}

pub(crate) fn clamp_diversity(requested: f64) -> f64 {
    let used = if requested.is_nan() {
        DEFAULT_DIVERSITY_FACTOR
    } else {
        requested.clamp(0.0, 1.0)
    };
    if (used - requested).abs() > f64::EPSILON || requested.is_nan() {
        warn!(requested, used, "diversity out of range (0-1), clamping");
    }
    used
}

pub(crate) fn resolve_default_log_level(common: &CommonArgs) -> &'static str {
    if common.quiet {
        "error"
    } else {
        match common.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
