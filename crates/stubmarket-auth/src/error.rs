//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email/password pair was rejected.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The refresh token was rejected, expired, or revoked.
    #[error("refresh rejected: {0}")]
    RefreshRejected(String),

    /// Too many authentication attempts, rate limited.
    #[error("rate limited")]
    RateLimited,

    /// The server rejected the request with a message (validation and the like).
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the server.
        status: u16,
        /// Message returned by the server.
        message: String,
    },

    /// The token format is invalid.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// A required claim is missing from the token.
    #[error("missing required claim: {0}")]
    MissingClaim(String),

    /// The server answered with a payload we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if retrying the same call later may succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Request(_))
    }
}
