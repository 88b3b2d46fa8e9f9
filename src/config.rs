use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GitHub token not found: set GITHUB_TOKEN or [github].token in .pr-insights.toml")]
    MissingToken,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration loaded from .pr-insights.toml.
///
/// Every field is optional; the defaults reproduce the fixed constants of
/// the collection study (200 repositories, 100 PRs each, 90s budget).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub collect: CollectConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub analyze: AnalyzeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    pub api_url: String,
    /// Transport timeout for pull-request page requests; discovery has none
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.github.com/graphql".to_string(),
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub max_repos: usize,
    pub max_prs_per_repo: usize,
    /// Wall-clock budget for a single repository's pull-request pages
    pub repo_timeout_secs: u64,
    /// Fixed pause after every successful page
    pub page_pause_ms: u64,
    /// 1-based index of the first repository to collect
    pub start_index: usize,
    pub checkpoint_every: usize,
    pub output: PathBuf,
    pub checkpoint_dir: PathBuf,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            max_repos: 200,
            max_prs_per_repo: 100,
            repo_timeout_secs: 90,
            page_pause_ms: 1000,
            start_index: 1,
            checkpoint_every: 10,
            output: PathBuf::from("repos_and_prs.json"),
            checkpoint_dir: PathBuf::from("."),
        }
    }
}

impl CollectConfig {
    pub fn repo_timeout(&self) -> Duration {
        Duration::from_secs(self.repo_timeout_secs)
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_prs_per_repo: usize,
    pub min_resolution_minutes: i64,
    pub input: PathBuf,
    pub output: PathBuf,
    pub names_output: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_prs_per_repo: 20,
            min_resolution_minutes: 10,
            input: PathBuf::from("repos_and_prs.json"),
            output: PathBuf::from("filtered_prs.json"),
            names_output: PathBuf::from("repos_names.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    pub input: PathBuf,
    pub chart_dir: PathBuf,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("filtered_prs.json"),
            chart_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from .pr-insights.toml in the current directory.
    /// Returns default config if the file doesn't exist; the GITHUB_TOKEN
    /// env var fills the token when the file leaves it unset.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-insights.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// The GitHub token, or a fatal error when none is configured.
    /// Blank tokens count as missing.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    /// Reject settings the collector cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collect.start_index == 0 {
            return Err(ConfigError::Invalid(
                "collect.start_index is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.collect.checkpoint_every == 0 {
            return Err(ConfigError::Invalid(
                "collect.checkpoint_every must be at least 1".to_string(),
            ));
        }
        if self.collect.max_prs_per_repo == 0 || self.collect.max_repos == 0 {
            return Err(ConfigError::Invalid(
                "collect.max_repos and collect.max_prs_per_repo must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.collect.max_repos, 200);
        assert_eq!(config.collect.max_prs_per_repo, 100);
        assert_eq!(config.collect.repo_timeout(), Duration::from_secs(90));
        assert_eq!(config.filter.min_prs_per_repo, 20);
        assert_eq!(config.filter.min_resolution_minutes, 10);
        assert_eq!(config.analyze.input, PathBuf::from("filtered_prs.json"));
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "ghp_example"

[collect]
start_index = 11
page_pause_ms = 0

[filter]
min_prs_per_repo = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_example"));
        assert_eq!(config.github.api_url, "https://api.github.com/graphql");
        assert_eq!(config.collect.start_index, 11);
        assert_eq!(config.collect.page_pause(), Duration::ZERO);
        assert_eq!(config.collect.max_prs_per_repo, 100);
        assert_eq!(config.filter.min_prs_per_repo, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_require_token() {
        let mut config = Config::default();
        assert!(matches!(config.require_token(), Err(ConfigError::MissingToken)));

        config.github.token = Some("   ".to_string());
        assert!(matches!(config.require_token(), Err(ConfigError::MissingToken)));

        config.github.token = Some("abc".to_string());
        assert_eq!(config.require_token().unwrap(), "abc");
    }

    #[test]
    fn test_validate_rejects_zero_start_index() {
        let mut config = Config::default();
        config.collect.start_index = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pr-insights.toml");
        std::fs::write(&path, "[analyze]\nchart_dir = \"charts\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analyze.chart_dir, PathBuf::from("charts"));
    }
}
