//! Auth API client for login, registration, logout, and token refresh.
//!
//! This module provides the `AuthClient` and the `RefreshExchange` trait the
//! API client uses to trade a refresh token for a new credential pair.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use stubmarket_core::Credentials;

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// Request payload for email/password login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
}

/// Request payload for account registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Public username.
    pub username: String,
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Issued credentials. Always present after login.
    pub credentials: Option<Credentials>,
    /// Username of the account.
    pub username: Option<String>,
    /// Server message.
    pub message: Option<String>,
}

/// Request payload for refreshing an access token.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

/// Raw response from the login/register/refresh endpoints.
///
/// Tokens may sit at the top level or inside `data`.
#[derive(Debug, Default, Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RawAuthData>,
    #[serde(default, alias = "accessToken")]
    access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuthData {
    #[serde(default)]
    username: Option<String>,
    #[serde(default, alias = "accessToken")]
    access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
}

impl RawAuthResponse {
    fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or_else(|| self.data.as_ref()?.access_token.as_deref())
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .or_else(|| self.data.as_ref()?.refresh_token.as_deref())
    }

    fn credentials(&self) -> Option<Credentials> {
        Some(Credentials::new(self.access_token()?, self.refresh_token()?))
    }

    fn into_session(self) -> AuthSession {
        AuthSession {
            credentials: self.credentials(),
            username: self.data.and_then(|d| d.username),
            message: self.message,
        }
    }
}

/// Error response from the auth API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Which call produced a response, for status-code mapping.
#[derive(Debug, Clone, Copy)]
enum Call {
    Login,
    Register,
    Refresh,
    Logout,
}

/// Trait for trading a refresh token for a new credential pair.
///
/// This trait abstracts the refresh exchange, allowing for mock
/// implementations in tests.
#[async_trait]
pub trait RefreshExchange: Send + Sync {
    /// Exchange `refresh_token` for a fresh credential pair.
    ///
    /// # Errors
    ///
    /// Returns `RefreshRejected` if the server refuses the token, or a
    /// transport error if no answer arrives.
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials>;
}

/// Client for the marketplace auth API.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    client: reqwest::Client,
}

impl AuthClient {
    /// Create a new auth client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a new auth client with a custom reqwest client.
    #[must_use]
    pub fn with_client(config: AuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The credentials are invalid (`LoginFailed`)
    /// - The request is malformed (`Rejected`)
    /// - Rate limit is exceeded (`RateLimited`)
    /// - The response carries no tokens (`InvalidResponse`)
    /// - Network or server error occurs
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthSession> {
        let url = self.config.login_url();
        tracing::debug!(url = %url, "Logging in");

        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(request_error)?;

        let raw = Self::handle_response(Call::Login, response).await?;
        if raw.credentials().is_none() {
            return Err(AuthError::InvalidResponse(
                "login response carries no tokens".to_string(),
            ));
        }

        Ok(raw.into_session())
    }

    /// Create a new account.
    ///
    /// Credentials are returned when the server signs the user in on signup.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` with the server message on validation failures
    /// (duplicate email, weak password), or a transport error.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthSession> {
        let url = self.config.register_url();
        tracing::debug!(url = %url, username = %req.username, "Registering account");

        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(request_error)?;

        Self::handle_response(Call::Register, response)
            .await
            .map(RawAuthResponse::into_session)
    }

    /// End the server-side session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call or cannot be reached.
    pub async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        let url = self.config.logout_url();

        let mut request = self.client.post(&url);
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(request_error)?;
        Self::handle_response(Call::Logout, response).await?;
        Ok(())
    }

    /// Handle the HTTP response and convert to a raw auth payload.
    async fn handle_response(call: Call, response: reqwest::Response) -> Result<RawAuthResponse> {
        let status = response.status();

        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
            if bytes.is_empty() {
                return Ok(RawAuthResponse::default());
            }
            return serde_json::from_slice(&bytes)
                .map_err(|e| AuthError::InvalidResponse(e.to_string()));
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| format!("HTTP {status}"));

        tracing::debug!(?call, status = %status, message = %message, "Auth call rejected");

        match (call, status.as_u16()) {
            (_, 429) => Err(AuthError::RateLimited),
            (Call::Login, 401) => Err(AuthError::LoginFailed(message)),
            (Call::Refresh, 401 | 403) => Err(AuthError::RefreshRejected(message)),
            (_, code) => Err(AuthError::Rejected {
                status: code,
                message,
            }),
        }
    }
}

#[async_trait]
impl RefreshExchange for AuthClient {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        let url = self.config.refresh_url();
        tracing::debug!(url = %url, "Refreshing access token");

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(request_error)?;

        let raw = Self::handle_response(Call::Refresh, response).await?;
        let access_token = raw.access_token().ok_or_else(|| {
            AuthError::InvalidResponse("refresh response carries no access token".to_string())
        })?;

        // Servers that do not rotate refresh tokens omit it
        let next_refresh = raw.refresh_token().unwrap_or(refresh_token);

        Ok(Credentials::new(access_token, next_refresh))
    }
}

fn request_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Request("timed out".to_string())
    } else {
        AuthError::Request(e.to_string())
    }
}

/// A scripted refresh exchange for testing.
///
/// Every call returns the configured outcome after an optional delay and
/// records the refresh token it was given.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRefreshExchange {
    outcome: std::result::Result<Credentials, String>,
    delay: std::time::Duration,
    seen: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRefreshExchange {
    /// An exchange that always issues `credentials`.
    #[must_use]
    pub fn succeeding(credentials: Credentials) -> Self {
        Self {
            outcome: Ok(credentials),
            delay: std::time::Duration::ZERO,
            seen: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// An exchange that always rejects with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            delay: std::time::Duration::ZERO,
            seen: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Wait `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of exchanges performed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// Refresh tokens received, in call order.
    #[must_use]
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RefreshExchange for MockRefreshExchange {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        self.seen.lock().push(refresh_token.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
            .clone()
            .map_err(AuthError::RefreshRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AuthClient {
        AuthClient::new(AuthConfig {
            base_url: server.uri(),
            ..AuthConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn login_request_serializes() {
        let req = LoginRequest {
            email: "user@example.com".to_string(),
            password: "secret".to_string(),
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("email"));
        assert!(json.contains("password"));
    }

    #[test]
    fn refresh_request_uses_camel_case() {
        let json = serde_json::to_value(RefreshRequest {
            refresh_token: "r-1",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "refreshToken": "r-1" }));
    }

    #[test]
    fn tokens_are_read_from_data_envelope() {
        let raw: RawAuthResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "data": {
                "username": "collector",
                "accessToken": "a",
                "refreshToken": "r"
            }
        }))
        .unwrap();

        let session = raw.into_session();
        assert_eq!(session.credentials, Some(Credentials::new("a", "r")));
        assert_eq!(session.username.as_deref(), Some("collector"));
    }

    #[tokio::test]
    async fn login_returns_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(serde_json::json!({
                "email": "c@example.com",
                "password": "pw"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Logged in successfully",
                "data": { "username": "collector" },
                "accessToken": "access-1",
                "refreshToken": "refresh-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = client_for(&server)
            .login(&LoginRequest {
                email: "c@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            session.credentials,
            Some(Credentials::new("access-1", "refresh-1"))
        );
        assert_eq!(session.username.as_deref(), Some("collector"));
    }

    #[tokio::test]
    async fn login_rejected_maps_to_login_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&LoginRequest {
                email: "c@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::LoginFailed(m) if m == "Invalid email or password"));
    }

    #[tokio::test]
    async fn login_without_tokens_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "data": { "username": "collector" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&LoginRequest {
                email: "c@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn register_surfaces_validation_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Email already registered"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .register(&RegisterRequest {
                username: "collector".to_string(),
                email: "c@example.com".to_string(),
                password: "longenough".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::Rejected { status: 400, ref message } if message == "Email already registered"
        ));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(serde_json::json!({ "refreshToken": "refresh-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "access-2",
                "refreshToken": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let creds = client_for(&server).refresh("refresh-1").await.unwrap();
        assert_eq!(creds, Credentials::new("access-2", "refresh-2"));
    }

    #[tokio::test]
    async fn refresh_keeps_token_when_not_rotated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "access-2" })),
            )
            .mount(&server)
            .await;

        let creds = client_for(&server).refresh("refresh-1").await.unwrap();
        assert_eq!(creds, Credentials::new("access-2", "refresh-1"));
    }

    #[tokio::test]
    async fn refresh_rejected_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": "revoked" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).refresh("refresh-1").await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshRejected(m) if m == "revoked"));
    }

    #[tokio::test]
    async fn logout_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Logged out successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).logout(Some("access-1")).await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        let client = AuthClient::new(AuthConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..AuthConfig::default()
        })
        .unwrap();

        let err = client.refresh("refresh-1").await.unwrap_err();
        assert!(matches!(err, AuthError::Request(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn mock_exchange_records_calls() {
        let mock = MockRefreshExchange::succeeding(Credentials::new("a", "r"));
        let creds = mock.refresh("old").await.unwrap();

        assert_eq!(creds, Credentials::new("a", "r"));
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.seen_tokens(), vec!["old".to_string()]);
    }

    #[tokio::test]
    async fn mock_exchange_fails_when_scripted() {
        let mock = MockRefreshExchange::failing("revoked");
        let err = mock.refresh("old").await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshRejected(_)));
    }
}
