//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::entrez::{DEFAULT_BASE_URL, DEFAULT_SRA_MIRROR};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry behavior for transient upstream failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,
}

/// Upstream endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// E-utilities API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Mirror root for accession-derived sequencing-run archives
    #[serde(default = "default_sra_mirror")]
    pub sra_mirror: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sra_mirror: default_sra_mirror(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_sra_mirror() -> String {
    DEFAULT_SRA_MIRROR.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Retry configuration: a capped linear loop with a fixed delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts before a transient failure escalates to fatal
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    9
}

fn default_delay_ms() -> u64 {
    500
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory under which per-uid dataset directories are created
    #[serde(default = "default_download_dir")]
    pub out_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            out_dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Load configuration from a file, with `ENTREZ_STREAM_*` environment
/// variables layered on top (e.g. `ENTREZ_STREAM_API__BASE_URL`).
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("ENTREZ_STREAM").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Configuration from environment variables and defaults only.
pub fn get_config() -> Config {
    config::Config::builder()
        .add_source(config::Environment::with_prefix("ENTREZ_STREAM").separator("__"))
        .build()
        .and_then(|settings| settings.try_deserialize())
        .unwrap_or_default()
}
