//! Normalized request errors and how they are reported to the user.

use std::time::Duration;

use serde_json::Value;
use stubmarket_auth::AuthError;
use stubmarket_store::StoreError;
use thiserror::Error;

use crate::notify::Notification;

/// A result type using `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Shown for HTTP 429 and while the local cooldown is active.
pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please wait.";
/// Shown for server errors without a user-facing message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
/// Shown when the server never answered.
pub const NO_RESPONSE: &str =
    "No response from the server. Please check your network connection or try again later.";
/// Shown for local failures.
pub const UNEXPECTED: &str = "An unexpected error occurred.";

/// Statuses whose server message is shown to the user verbatim.
const USER_FACING_STATUSES: [u16; 4] = [400, 401, 403, 422];

/// Every way a gateway request can fail.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        /// Response status code.
        status: u16,
        /// The `message` (or `error`) field of the response body.
        message: Option<String>,
        /// The decoded response body, if it was JSON.
        body: Option<Value>,
    },

    /// The request was sent but no response arrived.
    #[error("no response")]
    NoResponse(String),

    /// The per-request timeout fired before the response completed.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    /// The caller canceled the request, or a newer request superseded it.
    #[error("request canceled")]
    Canceled,

    /// Refused locally while the rate-limit cooldown is active.
    #[error("rate limited")]
    RateLimited,

    /// The session can no longer be renewed; the user has to log in again.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// A local failure (storage, serialization, malformed request).
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// The HTTP status this error stands for, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited => Some(429),
            _ => None,
        }
    }

    /// Returns `true` if the request was canceled.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns `true` if the user has to authenticate again.
    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired(_) | Self::Http { status: 401, .. }
        )
    }

    /// The message to show the user for this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::RateLimited | Self::Http { status: 429, .. } => TOO_MANY_REQUESTS,
            Self::Http { status, message, .. } if USER_FACING_STATUSES.contains(status) => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_FAILURE),
            Self::Http { .. } => GENERIC_FAILURE,
            Self::NoResponse(_) | Self::TimedOut(_) => NO_RESPONSE,
            Self::Canceled => "Request canceled.",
            Self::SessionExpired(_) => "Your session has expired. Please log in again.",
            Self::Unexpected(_) => UNEXPECTED,
        }
    }

    /// The notification this error produces, or `None` if it stays silent.
    ///
    /// Cancellations, expired sessions, and HTTP 401 are never notified.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::Canceled | Self::SessionExpired(_) | Self::Http { status: 401, .. } => None,
            _ => Some(Notification::error(self.message())),
        }
    }

    /// Classify a transport failure from reqwest.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Unexpected(err.to_string())
        } else {
            Self::NoResponse(err.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(format!("malformed payload: {err}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::LoginFailed(message) | AuthError::RefreshRejected(message) => Self::Http {
                status: 401,
                message: Some(message),
                body: None,
            },
            AuthError::RateLimited => Self::Http {
                status: 429,
                message: None,
                body: None,
            },
            AuthError::Rejected { status, message } => Self::Http {
                status,
                message: Some(message),
                body: None,
            },
            AuthError::Request(detail) => Self::NoResponse(detail),
            e @ (AuthError::InvalidToken(_)
            | AuthError::MissingClaim(_)
            | AuthError::InvalidResponse(_)
            | AuthError::Internal(_)) => Self::Unexpected(e.to_string()),
        }
    }
}
