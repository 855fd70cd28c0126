//! Application configuration loading for CLI defaults.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Environment variable overriding `[search] api_key`.
pub const API_KEY_ENV: &str = "SEMANTIC_SCHOLAR_API_KEY";

const CONFIG_DIR_NAME: &str = "paperscout";
const CONFIG_FILE_NAME: &str = "config.toml";

/// TOML-backed file configuration for paperscout defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub search: SearchSection,
    pub selection: SelectionSection,
    pub paths: PathsSection,
    pub download: DownloadSection,
    pub quality: QualitySection,
}

/// `[search]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    /// API root, for mirrors and tests.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Candidates retrieved before selection.
    pub initial_limit: Option<usize>,
    /// Minimum gap between outbound requests.
    pub rate_limit_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

/// `[selection]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionSection {
    pub max_papers: Option<usize>,
    pub randomize: Option<bool>,
    pub diversity: Option<f64>,
}

/// `[paths]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub data_dir: Option<PathBuf>,
}

/// `[download]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSection {
    pub concurrency: Option<usize>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

/// `[quality]`: technical terms grouped by domain.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualitySection {
    pub terms: Option<BTreeMap<String, Vec<String>>>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = self.search.base_url.as_deref()
            && url::Url::parse(base_url).is_err()
        {
            bail!("Invalid config value for `search.base_url`: '{base_url}' is not a URL");
        }
        if let Some(limit) = self.search.initial_limit
            && !(1..=1000).contains(&limit)
        {
            bail!("Invalid config value for `search.initial_limit`: {limit}. Expected range: 1..=1000");
        }
        if let Some(rate_limit) = self.search.rate_limit_ms
            && rate_limit > 60_000
        {
            bail!("Invalid config value for `search.rate_limit_ms`: {rate_limit}. Expected range: 0..=60000");
        }
        if let Some(retries) = self.search.max_retries
            && retries > 10
        {
            bail!("Invalid config value for `search.max_retries`: {retries}. Expected range: 0..=10");
        }
        validate_timeout_secs("search.connect_timeout_secs", self.search.connect_timeout_secs)?;
        validate_timeout_secs("search.read_timeout_secs", self.search.read_timeout_secs)?;

        if let Some(max_papers) = self.selection.max_papers
            && !(1..=20).contains(&max_papers)
        {
            bail!("Invalid config value for `selection.max_papers`: {max_papers}. Expected range: 1..=20");
        }
        if let Some(diversity) = self.selection.diversity
            && !(0.0..=1.0).contains(&diversity)
        {
            bail!("Invalid config value for `selection.diversity`: {diversity}. Expected range: 0.0..=1.0");
        }

        if let Some(concurrency) = self.download.concurrency
            && !(1..=16).contains(&concurrency)
        {
            bail!("Invalid config value for `download.concurrency`: {concurrency}. Expected range: 1..=16");
        }
        validate_timeout_secs("download.connect_timeout_secs", self.download.connect_timeout_secs)?;
        validate_timeout_secs("download.read_timeout_secs", self.download.read_timeout_secs)?;

        if let Some(terms) = &self.quality.terms
            && terms.values().flatten().all(|term| term.trim().is_empty())
        {
            bail!("Invalid config value for `quality.terms`: at least one non-empty term is required");
        }

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config, or defaults when no file was read.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
    /// API key from the environment, which wins over the file.
    pub env_api_key: Option<String>,
}

impl LoadedConfig {
    /// The API key to send, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.env_api_key
            .as_deref()
            .or(self.config.search.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/paperscout/config.toml`
/// 2. `$HOME/.config/paperscout/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit`, or from the default path if present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let env_api_key = env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty());

    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
            env_api_key,
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig {
            path,
            env_api_key,
            ..LoadedConfig::default()
        });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config,
        loaded_from_file: true,
        env_api_key,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
[selection]
max_papers = 8
randomize = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.selection.max_papers, Some(8));
        assert_eq!(cfg.selection.randomize, Some(true));
        assert!(cfg.selection.diversity.is_none());
        assert!(cfg.paths.data_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_sections() {
        let cfg = parse_config_str(
            r#"
[search]
base_url = "http://localhost:8080/graph/v1"
api_key = "secret"
initial_limit = 250
rate_limit_ms = 2000
max_retries = 5
connect_timeout_secs = 10
read_timeout_secs = 60

[selection]
diversity = 0.5

[paths]
data_dir = "/tmp/papers-data"

[download]
concurrency = 4
read_timeout_secs = 120

[quality.terms]
chemistry = ["catalyst", "reagent"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.search.initial_limit, Some(250));
        assert_eq!(cfg.search.rate_limit_ms, Some(2000));
        assert_eq!(cfg.search.max_retries, Some(5));
        assert_eq!(cfg.paths.data_dir, Some(PathBuf::from("/tmp/papers-data")));
        assert_eq!(cfg.download.concurrency, Some(4));
        assert_eq!(cfg.download.read_timeout_secs, Some(120));
        let terms = cfg.quality.terms.unwrap();
        assert_eq!(terms["chemistry"], vec!["catalyst", "reagent"]);
    }

    #[test]
    fn test_parse_config_empty_is_default() {
        assert_eq!(parse_config_str("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("[search]\nunknown_key = 123").unwrap_err();
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_wrong_type() {
        assert!(parse_config_str("[selection]\nrandomize = \"yes\"").is_err());
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_parse_config_rejects_invalid_max_papers() {
        let err = parse_config_str("[selection]\nmax_papers = 21").unwrap_err();
        assert!(err.to_string().contains("selection.max_papers"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_diversity() {
        let err = parse_config_str("[selection]\ndiversity = 1.5").unwrap_err();
        assert!(err.to_string().contains("selection.diversity"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_concurrency() {
        let err = parse_config_str("[download]\nconcurrency = 0").unwrap_err();
        assert!(err.to_string().contains("download.concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_rate_limit() {
        let err = parse_config_str("[search]\nrate_limit_ms = 60001").unwrap_err();
        assert!(err.to_string().contains("search.rate_limit_ms"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("[download]\nconnect_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("download.connect_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_bad_base_url() {
        let err = parse_config_str("[search]\nbase_url = \"not a url\"").unwrap_err();
        assert!(err.to_string().contains("search.base_url"));
    }

    #[test]
    fn test_parse_config_rejects_empty_term_dictionary() {
        let err = parse_config_str("[quality.terms]\nempty = []").unwrap_err();
        assert!(err.to_string().contains("quality.terms"));
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_load_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[paths]\ndata_dir = \"./elsewhere\"\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.paths.data_dir, Some(PathBuf::from("./elsewhere")));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[download]\nconcurrency = 99\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"));
        assert!(format!("{err:#}").contains("download.concurrency"));
    }

    #[test]
    fn test_api_key_prefers_environment_value() {
        let mut loaded = LoadedConfig::default();
        assert_eq!(loaded.api_key(), None);

        loaded.config.search.api_key = Some("from-file".to_string());
        assert_eq!(loaded.api_key(), Some("from-file"));

        loaded.env_api_key = Some("from-env".to_string());
        assert_eq!(loaded.api_key(), Some("from-env"));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut loaded = LoadedConfig::default();
        loaded.config.search.api_key = Some("  ".to_string());
        assert_eq!(loaded.api_key(), None);
    }
}
