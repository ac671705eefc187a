//! Configuration loading for the CLI.
//!
//! Settings come from an optional JSON file, overridden by command-line flags
//! and `STUBMARKET_*` environment variables (clap resolves those two).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use stubmarket_client::ClientConfig;

/// Contents of the JSON config file. Every field is optional.
///
/// The `VITE_APP_*` aliases accept the web frontend's `config.json` as-is.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// API base URL.
    #[serde(default, alias = "VITE_APP_API_BASE_URL")]
    pub api_base_url: Option<String>,
    /// Auth API base URL.
    #[serde(default, alias = "VITE_APP_AUTH_API_BASE_URL")]
    pub auth_base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    /// Rate-limit cooldown in milliseconds.
    #[serde(default)]
    pub rate_limit_cooldown_ms: Option<u64>,
    /// Directory holding the persisted session.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    /// `--api-url` / `STUBMARKET_API_URL`.
    pub api_url: Option<String>,
    /// `--auth-url` / `STUBMARKET_AUTH_URL`.
    pub auth_url: Option<String>,
    /// `--state-dir` / `STUBMARKET_STATE_DIR`.
    pub state_dir: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug)]
pub struct Settings {
    /// Client configuration.
    pub client: ClientConfig,
    /// Directory of the `RocksDB` session store.
    pub state_dir: PathBuf,
}

impl Settings {
    /// Merge defaults, the config file, and overrides (highest wins).
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        let mut client = ClientConfig::default();
        if let Some(url) = overrides.api_url.or(file.api_base_url) {
            client.api_base_url = url;
        }
        client.auth_base_url = overrides.auth_url.or(file.auth_base_url);
        if let Some(secs) = file.request_timeout_seconds {
            client.request_timeout_seconds = secs;
        }
        if let Some(ms) = file.rate_limit_cooldown_ms {
            client.rate_limit_cooldown_ms = ms;
        }

        let state_dir = overrides
            .state_dir
            .or(file.state_dir)
            .unwrap_or_else(default_state_dir);

        Self { client, state_dir }
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".stubmarket")
}
