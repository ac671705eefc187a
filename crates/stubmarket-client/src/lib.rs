//! API gateway client for the stubmarket REST API.
//!
//! Every outbound HTTP call of the application goes through [`ApiClient`].
//! The client:
//!
//! - Attaches the bearer token and refreshes it once for all concurrent
//!   requests when it is about to expire
//! - Refuses requests locally for a cooldown after the server answers 429
//! - Lets keyed requests supersede each other ([`Cancelable`])
//! - Normalizes failures into [`ApiError`] and reports them to a
//!   [`NotificationSink`]
//! - Flags the session as expired ([`AuthState`]) on 401 or a failed refresh
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   endpoints::*   │  one function per REST endpoint
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │    ApiClient     │────▶│ RateLimitWindow  │
//! │                  │────▶│ CancelRegistry   │
//! │                  │────▶│ NotificationSink │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │RefreshCoordinator│────▶│ RefreshExchange  │
//! │ (single flight)  │     │ (auth crate)     │
//! └────────┬─────────┘     └──────────────────┘
//!          ▼
//! ┌──────────────────┐
//! │   LocalStore     │
//! │  (store crate)   │
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stubmarket_client::{endpoints, ApiClient, ClientConfig};
//!
//! # async fn example() -> Result<(), stubmarket_client::ApiError> {
//! let client = ApiClient::builder(ClientConfig::new("http://localhost:5000")).build()?;
//!
//! for listing in endpoints::marketplace::listings(&client, None).await? {
//!     println!("{} {} {}", listing.id, listing.asking_price, listing.currency);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth_state;
pub mod cancel;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod rate_limit;
pub mod refresh;
pub mod request;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth_state::AuthState;
pub use cancel::{CancelHandle, Cancelable};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use gateway::{ApiClient, ApiClientBuilder};
pub use notify::{ChannelSink, Notification, NotificationSink, Severity, TracingSink};
pub use request::{Body, Request};

#[cfg(any(test, feature = "test-utils"))]
pub use notify::RecordingSink;
