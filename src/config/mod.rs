//! Configuration loading
//!
//! The config file is JSON5 with camelCase keys. Every section is optional
//! and falls back to defaults:
//!
//! ```json5
//! {
//!   logging: { level: "debug", format: "json" },
//!   enrichment: { titleSuffix: " [modified]", deadlineMs: 30000 },
//!   media: { tempDir: "/var/tmp/notifex", fetchTimeoutMs: 10000, maxSize: 20971520 },
//! }
//! ```
//!
//! Path resolution: `NOTIFEX_CONFIG_PATH`, then
//! `{config_dir}/notifex/notifex.json5`.

pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::media::{FetchConfig, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_SIZE, DEFAULT_USER_AGENT};
use crate::notification::{DEFAULT_DEADLINE_MS, DEFAULT_TITLE_SUFFIX};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "NOTIFEX_CONFIG_PATH";

/// Config errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

/// Pipeline behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentConfig {
    /// Appended to every notification title
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,

    /// Time budget per notification, in milliseconds
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            title_suffix: default_title_suffix(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl EnrichmentConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

fn default_title_suffix() -> String {
    DEFAULT_TITLE_SUFFIX.to_string()
}

fn default_deadline_ms() -> u64 {
    DEFAULT_DEADLINE_MS
}

/// Media retrieval and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConfig {
    /// Root for attachment directories (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum media size in bytes
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    #[serde(default = "default_true")]
    pub allow_file_urls: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_size: default_max_size(),
            allow_file_urls: true,
            user_agent: default_user_agent(),
        }
    }
}

impl MediaConfig {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_ms: self.fetch_timeout_ms,
            max_size: self.max_size,
            allow_file_urls: self.allow_file_urls,
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Resolve the config file path.
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifex")
        .join("notifex.json5")
}

/// Load config from the resolved path; a missing file yields defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = get_config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Load config from an explicit path; the file must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse JSON5 config text. Blank input yields defaults.
pub fn parse_config(raw: &str) -> Result<Config, String> {
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    json5::from_str(raw).map_err(|e| e.to_string())
}
