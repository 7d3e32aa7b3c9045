//! TOML configuration.
//!
//! Every section is optional. A missing default config file means built-in
//! defaults; command-line flags override whatever the file says.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("llmstxt/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    /// Number of fetches that run concurrently within one batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Directory (relative to the summary) that reference files live in.
    #[serde(default = "default_references_dir")]
    pub references_dir: String,
    #[serde(default = "default_max_category_items")]
    pub max_category_items: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            references_dir: default_references_dir(),
            max_category_items: default_max_category_items(),
        }
    }
}

fn default_references_dir() -> String {
    "references".to_string()
}
fn default_max_category_items() -> usize {
    5
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, timeout_secs: Option<u64>, batch_size: Option<usize>) -> Result<Self> {
        if let Some(t) = timeout_secs {
            self.http.timeout_secs = t;
        }
        if let Some(b) = batch_size {
            self.download.batch_size = b;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be > 0");
        }
        if self.http.user_agent.trim().is_empty() {
            anyhow::bail!("http.user_agent must not be empty");
        }
        if self.download.batch_size == 0 {
            anyhow::bail!("download.batch_size must be > 0");
        }
        if self.summary.max_category_items == 0 {
            anyhow::bail!("summary.max_category_items must be > 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.validate()?;
    Ok(config)
}
