//! Token handling for the stubmarket client.
//!
//! This crate provides the authentication collaborators of the API client:
//!
//! - Local access-token decoding and the early-expiry check
//! - The refresh exchange (trading a refresh token for a new pair)
//! - Login, registration, and logout against the marketplace auth API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   ApiClient      │────▶│ RefreshExchange  │
//! │   (client crate) │     │   (trait)        │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │                        │
//!          │ token::is_fresh        │
//!          ▼               ┌────────▼─────────┐
//! ┌──────────────────┐     │   AuthClient     │
//! │   token          │     │   (impl)         │
//! │   (local decode) │     └────────┬─────────┘
//! └──────────────────┘              │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │   /auth/*        │
//!                          │   endpoints      │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stubmarket_auth::{AuthClient, AuthConfig, LoginRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AuthClient::new(AuthConfig::default())?;
//!
//! let session = client
//!     .login(&LoginRequest {
//!         email: "collector@example.com".to_string(),
//!         password: "hunter22".to_string(),
//!     })
//!     .await?;
//!
//! println!("Logged in as {:?}", session.username);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::time::Duration;

use serde::Deserialize;

pub mod client;
pub mod error;
pub mod token;

pub use client::{AuthClient, AuthSession, LoginRequest, RefreshExchange, RegisterRequest};
pub use error::{AuthError, Result};
pub use token::TokenClaims;

#[cfg(any(test, feature = "test-utils"))]
pub use client::MockRefreshExchange;

/// Configuration for the marketplace auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the auth API (e.g., `http://localhost:5000`).
    #[serde(default = "AuthConfig::default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "AuthConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl AuthConfig {
    fn default_base_url() -> String {
        "http://localhost:5000".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Build an endpoint URL under the auth API.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Get the login endpoint URL.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.endpoint("login")
    }

    /// Get the registration endpoint URL.
    #[must_use]
    pub fn register_url(&self) -> String {
        self.endpoint("register")
    }

    /// Get the token refresh endpoint URL.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        self.endpoint("refresh")
    }

    /// Get the logout endpoint URL.
    #[must_use]
    pub fn logout_url(&self) -> String {
        self.endpoint("logout")
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}
