//! Client configuration types.
//!
//! This module defines configuration structures for the API gateway client.

use std::time::Duration;

use serde::Deserialize;
use stubmarket_auth::AuthConfig;

/// Configuration for the API gateway client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to (e.g., "http://localhost:5000").
    #[serde(default = "ClientConfig::default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the auth API. Falls back to `api_base_url` when unset.
    #[serde(default)]
    pub auth_base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "ClientConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How long requests are refused locally after an HTTP 429, in milliseconds.
    #[serde(default = "ClientConfig::default_rate_limit_cooldown")]
    pub rate_limit_cooldown_ms: u64,

    /// Access tokens expiring within this many seconds are refreshed first.
    #[serde(default = "ClientConfig::default_expiry_buffer")]
    pub expiry_buffer_seconds: u64,
}

impl ClientConfig {
    fn default_api_base_url() -> String {
        "http://localhost:5000".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_rate_limit_cooldown() -> u64 {
        10_000 // 10 seconds
    }

    const fn default_expiry_buffer() -> u64 {
        300 // 5 minutes
    }

    /// Create a configuration pointing at `api_base_url`, with defaults elsewhere.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the rate-limit cooldown as a `Duration`.
    #[must_use]
    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    /// Get the early-expiry buffer as a `Duration`.
    #[must_use]
    pub fn expiry_buffer(&self) -> Duration {
        Duration::from_secs(self.expiry_buffer_seconds)
    }

    /// Derive the auth API configuration.
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            base_url: self
                .auth_base_url
                .clone()
                .unwrap_or_else(|| self.api_base_url.clone()),
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::default_api_base_url(),
            auth_base_url: None,
            request_timeout_seconds: Self::default_request_timeout(),
            rate_limit_cooldown_ms: Self::default_rate_limit_cooldown(),
            expiry_buffer_seconds: Self::default_expiry_buffer(),
        }
    }
}
