use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::Token;
use crate::error::FtprError;

pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_GITLAB_BASE_URL: &str = "https://gitlab.com";

/// Configuration file structure for ftpr.
///
/// Lists the repositories to scan along with HTTP and scan tuning.
/// Configuration files are loaded from the current directory or specified path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Repositories to scan, in report order
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// HTTP requester settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Scan parameters
    #[serde(default)]
    pub scan: ScanConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Hosting platform of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    GitHub,
    GitLab,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::GitHub => DEFAULT_GITHUB_BASE_URL,
            Self::GitLab => DEFAULT_GITLAB_BASE_URL,
        }
    }

    /// Environment variable consulted when a repository has no token configured.
    pub fn token_env_var(self) -> &'static str {
        match self {
            Self::GitHub => "GITHUB_TOKEN",
            Self::GitLab => "GITLAB_TOKEN",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = FtprError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            other => Err(FtprError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = FtprError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.label().to_ascii_lowercase()
    }
}

/// One repository to scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    pub platform: Platform,

    /// REST API root; GitHub expects the API host, GitLab the instance URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<Token>,

    /// `owner/repo` on GitHub, numeric id or `group/project` path on GitLab
    pub repo: String,
}

impl RepositoryConfig {
    pub fn new(platform: Platform, repo: impl Into<String>) -> Self {
        Self {
            platform,
            base_url: None,
            token: None,
            repo: repo.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.platform.default_base_url())
    }
}

fn deserialize_token<'de, D>(deserializer: D) -> std::result::Result<Option<Token>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(Token::from).filter(|token| !token.is_empty()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First exponential back-off delay, doubled after each failed attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Wait used on HTTP 429 when the server sends no `Retry-After`
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScanConfig {
    /// Hard cap of merge requests considered per repository
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Hard cap of jobs read from a single GitLab pipeline
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    /// Merge requests evaluated in parallel within one repository
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            per_page: default_per_page(),
            max_jobs: default_max_jobs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_retry_after_secs() -> u64 {
    60
}

fn default_limit() -> usize {
    100
}

fn default_per_page() -> usize {
    100
}

fn default_max_jobs() -> usize {
    1000
}

fn default_concurrency() -> usize {
    1
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ftpr.toml
    /// 3. ./ftpr.json
    /// 4. ./ftpr.yaml
    /// 5. ./ftpr.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                log::warn!("Config file not found: {}, using defaults", path.display());
                return Ok(Self::default());
            }
            return Self::load_from_path(path);
        }

        let candidates = ["ftpr.toml", "ftpr.json", "ftpr.yaml", "ftpr.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Fills missing repository tokens using `lookup` (normally the process environment).
    #[must_use]
    pub fn with_fallback_tokens<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for repo in &mut self.repositories {
            if repo.token.is_none() {
                repo.token = lookup(repo.platform.token_env_var())
                    .map(Token::from)
                    .filter(|token| !token.is_empty());
            }
        }
        self
    }
}
