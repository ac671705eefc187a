//! Session endpoints.
//!
//! Login, registration, and logout talk to the auth API directly through
//! [`AuthClient`]; their failures are returned to the caller rather than
//! notified. The status check is a regular gateway call.

use stubmarket_auth::{token, AuthClient, AuthSession, LoginRequest, RegisterRequest};
use stubmarket_store::Credentials;

use super::data;
use crate::error::{ApiError, Result};
use crate::gateway::ApiClient;
use crate::request::Request;
use crate::types::AuthStatus;

/// Resource of the session status check.
pub const STATUS_CHECK: &str = "/auth/userAuthStatusCheck";

/// Log in and persist the issued credentials and username.
///
/// Clears the session-expired flag on success.
///
/// # Errors
///
/// Returns `Http { status: 401 }` for bad credentials, or any other
/// [`ApiError`] the auth API produces.
pub async fn login(auth: &AuthClient, api: &ApiClient, request: &LoginRequest) -> Result<AuthSession> {
    let session = auth.login(request).await?;
    let credentials = session
        .credentials
        .as_ref()
        .ok_or_else(|| ApiError::Unexpected("login issued no credentials".to_string()))?;

    persist(api, credentials, session.username.as_deref())?;
    tracing::info!(username = ?session.username, "Logged in");
    Ok(session)
}

/// Create an account. If the server signs the user in, the session is
/// persisted as for [`login`].
///
/// # Errors
///
/// Returns `Http { status: 400 }` with the server message on validation
/// failures, or any other [`ApiError`] the auth API produces.
pub async fn register(
    auth: &AuthClient,
    api: &ApiClient,
    request: &RegisterRequest,
) -> Result<AuthSession> {
    let session = auth.register(request).await?;
    if let Some(credentials) = &session.credentials {
        let username = session.username.as_deref().unwrap_or(&request.username);
        persist(api, credentials, Some(username))?;
    }
    tracing::info!(username = %request.username, "Registered");
    Ok(session)
}

/// End the session. Local state is cleared even if the server call fails.
///
/// # Errors
///
/// Returns the server-side failure, after the local session was cleared.
pub async fn logout(auth: &AuthClient, api: &ApiClient) -> Result<()> {
    let access = api.store().access_token()?;
    let outcome = auth.logout(access.as_deref()).await;

    api.store().clear_session()?;

    match outcome {
        Ok(()) => {
            tracing::info!("Logged out");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Server logout failed; local session cleared");
            Err(e.into())
        }
    }
}

/// Ask the server whether the current session is authenticated.
///
/// # Errors
///
/// Returns an [`ApiError`] if the request fails.
pub async fn status_check(api: &ApiClient) -> Result<AuthStatus> {
    data(api, api.get(Request::new(STATUS_CHECK)).await?)
}

fn persist(api: &ApiClient, credentials: &Credentials, username: Option<&str>) -> Result<()> {
    let store = api.store();
    store.save_credentials(credentials)?;

    let username = username.map(str::to_string).or_else(|| {
        token::decode_claims(&credentials.access_token)
            .ok()
            .and_then(|claims| claims.username)
    });
    if let Some(username) = username {
        store.save_user(&username)?;
    }

    api.auth_state().reset();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{logged_in_client, token_expiring_in};
    use stubmarket_auth::AuthConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_for(server: &MockServer) -> AuthClient {
        AuthClient::new(AuthConfig {
            base_url: server.uri(),
            ..AuthConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn login_persists_session_and_resets_flag() {
        let server = MockServer::start().await;
        let access = token_expiring_in(3600);
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Logged in successfully",
                "data": { "username": "collector" },
                "accessToken": access.clone(),
                "refreshToken": "refresh-9"
            })))
            .mount(&server)
            .await;

        let (api, _, _) = logged_in_client(&server);
        api.store().clear_session().unwrap();
        api.auth_state().mark_expired();

        login(
            &auth_for(&server),
            &api,
            &LoginRequest {
                email: "c@example.com".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(api.store().access_token().unwrap(), Some(access));
        assert_eq!(api.store().refresh_token().unwrap().as_deref(), Some("refresh-9"));
        assert_eq!(api.store().user().unwrap().as_deref(), Some("collector"));
        assert!(!api.auth_state().is_expired());
    }

    #[tokio::test]
    async fn login_falls_back_to_token_username() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": token_expiring_in(3600),
                "refreshToken": "refresh-9"
            })))
            .mount(&server)
            .await;

        let (api, _, _) = logged_in_client(&server);
        api.store().clear_session().unwrap();

        login(
            &auth_for(&server),
            &api,
            &LoginRequest {
                email: "c@example.com".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(api.store().user().unwrap().as_deref(), Some("collector"));
    }

    #[tokio::test]
    async fn failed_login_keeps_state_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let (api, sink, token) = logged_in_client(&server);
        let err = login(
            &auth_for(&server),
            &api,
            &LoginRequest {
                email: "c@example.com".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(api.store().access_token().unwrap(), Some(token));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (api, _, _) = logged_in_client(&server);
        api.store().save_user("collector").unwrap();
        api.store().set_print_by_app(true).unwrap();

        let err = logout(&auth_for(&server), &api).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(api.store().access_token().unwrap().is_none());
        assert!(api.store().refresh_token().unwrap().is_none());
        assert!(api.store().user().unwrap().is_none());
        assert!(!api.store().print_by_app().unwrap());
    }

    #[tokio::test]
    async fn status_check_sends_bearer_token() {
        let server = MockServer::start().await;
        let (api, _, token) = logged_in_client(&server);
        Mock::given(method("GET"))
            .and(path(STATUS_CHECK))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "User is authenticated",
                "data": { "is_authenticated": true, "username": "collector", "user_id": 4 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = status_check(&api).await.unwrap();
        assert!(status.is_authenticated);
        assert_eq!(status.user_id, Some(4));
    }
}
