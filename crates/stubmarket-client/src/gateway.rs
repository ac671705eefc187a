//! The API gateway client.
//!
//! Every outbound call goes through [`ApiClient`]. Before a request is sent
//! the client checks the local rate-limit window and makes sure the bearer
//! token is fresh (refreshing it once for all concurrent callers). After the
//! response arrives it normalizes failures into [`ApiError`], notifies the
//! user, and updates the rate-limit window and auth state.

use std::sync::Arc;

use futures::future::{Abortable, Aborted};
use futures::FutureExt;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use stubmarket_auth::{AuthClient, RefreshExchange};
use stubmarket_store::{LocalStore, MemoryStorage};

use crate::auth_state::AuthState;
use crate::cancel::{CancelRegistry, Cancelable};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::notify::{NotificationSink, TracingSink};
use crate::rate_limit::RateLimitWindow;
use crate::refresh::RefreshCoordinator;
use crate::request::{Body, Request};

/// Client for the stubmarket REST API.
///
/// Cloning is cheap; clones share tokens, the rate-limit window, the
/// refresh coordinator, and the cancel registry.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    http: reqwest::Client,
    store: LocalStore,
    refresh: Arc<RefreshCoordinator>,
    notifier: Arc<dyn NotificationSink>,
    auth_state: AuthState,
    rate_limit: RateLimitWindow,
    cancels: CancelRegistry,
}

impl ApiClient {
    /// Start building a client.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The persisted client state.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    /// The session-expired signal.
    #[must_use]
    pub fn auth_state(&self) -> &AuthState {
        &self.inner.auth_state
    }

    /// Whether requests are currently refused by the local cooldown.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.inner.rate_limit.is_limited()
    }

    /// Send a GET request. Query parameters come from [`Request::query`].
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx outcome.
    pub async fn get(&self, request: Request) -> Result<Value> {
        self.execute(Method::GET, request).await
    }

    /// Send a GET request under `key`, superseding any request already
    /// running under the same key.
    #[must_use]
    pub fn get_cancelable(&self, key: &str, request: Request) -> Cancelable {
        self.cancelable(key, Method::GET, request)
    }

    /// Send a POST request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx outcome.
    pub async fn post(&self, request: Request) -> Result<Value> {
        self.execute(Method::POST, request).await
    }

    /// Send a PATCH request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx outcome.
    pub async fn patch(&self, request: Request) -> Result<Value> {
        self.execute(Method::PATCH, request).await
    }

    /// Send a PATCH request under `key`, superseding any request already
    /// running under the same key.
    #[must_use]
    pub fn patch_cancelable(&self, key: &str, request: Request) -> Cancelable {
        self.cancelable(key, Method::PATCH, request)
    }

    /// Send a PUT request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx outcome.
    pub async fn put(&self, request: Request) -> Result<Value> {
        self.execute(Method::PUT, request).await
    }

    /// Send a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for any non-2xx outcome.
    pub async fn delete(&self, request: Request) -> Result<Value> {
        self.execute(Method::DELETE, request).await
    }

    /// Report a failure raised around a call (payload encoding or decoding)
    /// and hand it back.
    pub(crate) fn fail(&self, error: ApiError) -> ApiError {
        self.report(&error);
        error
    }

    /// Apply the side effects of a failed call: auth state and notification.
    fn report(&self, error: &ApiError) {
        if error.is_auth_expired() {
            self.inner.auth_state.mark_expired();
        }
        if let Some(notification) = error.notification() {
            self.inner.notifier.notify(notification);
        }
    }

    fn cancelable(&self, key: &str, method: Method, request: Request) -> Cancelable {
        let (id, handle, registration) = self.inner.cancels.register(key);
        let client = self.clone();
        let key = key.to_string();

        let result = async move {
            let outcome = Abortable::new(client.execute(method, request), registration).await;
            client.inner.cancels.release(&key, id);
            outcome.unwrap_or_else(|Aborted| {
                tracing::debug!(key = %key, "Request canceled");
                Err(ApiError::Canceled)
            })
        }
        .boxed();

        Cancelable::new(result, handle)
    }

    async fn execute(&self, method: Method, request: Request) -> Result<Value> {
        let outcome = self.dispatch(method, request).await;
        if let Err(e) = &outcome {
            self.report(e);
        }
        outcome
    }

    async fn dispatch(&self, method: Method, mut request: Request) -> Result<Value> {
        if self.inner.rate_limit.is_limited() {
            tracing::debug!(
                remaining = ?self.inner.rate_limit.remaining(),
                "Refusing request during rate-limit cooldown"
            );
            return Err(ApiError::RateLimited);
        }

        let token = self.inner.refresh.valid_token().await?;

        let url = request.url(&self.inner.config.api_base_url);
        let mut builder = self.inner.http.request(method.clone(), &url);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.take_body() {
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        tracing::debug!(method = %method, url = %url, "Sending request");

        let timeout = self.inner.config.request_timeout();
        let (status, bytes) = tokio::time::timeout(timeout, async {
            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::from_transport(&e))?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ApiError::from_transport(&e))?;
            Ok::<_, ApiError>((status, bytes))
        })
        .await
        .map_err(|_| {
            tracing::warn!(method = %method, url = %url, ?timeout, "Request timed out");
            ApiError::TimedOut(timeout)
        })??;

        self.interpret(status, &bytes)
    }

    fn interpret(&self, status: StatusCode, bytes: &[u8]) -> Result<Value> {
        if status.is_success() {
            self.inner.rate_limit.clear();
            return Ok(decode_success(bytes));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.inner.rate_limit.trip();
        }

        let body = serde_json::from_slice::<Value>(bytes).ok();
        let message = body.as_ref().and_then(|b| {
            b.get("message")
                .or_else(|| b.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        tracing::debug!(status = status.as_u16(), message = ?message, "Request failed");

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
            body,
        })
    }
}

/// Decode a 2xx body. Empty bodies become `Null`, non-JSON text a string.
fn decode_success(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.inner.config.api_base_url)
            .field("refresh", &self.inner.refresh)
            .field("inflight", &self.inner.cancels.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`].
///
/// Unset collaborators default to in-memory storage, an [`AuthClient`]
/// derived from the configuration, a [`TracingSink`], and a fresh
/// [`AuthState`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<LocalStore>,
    exchange: Option<Arc<dyn RefreshExchange>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    auth_state: Option<AuthState>,
    http: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            exchange: None,
            notifier: None,
            auth_state: None,
            http: None,
        }
    }

    /// Persisted state to read tokens from.
    #[must_use]
    pub fn store(mut self, store: LocalStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Refresh exchange used when the access token goes stale.
    #[must_use]
    pub fn refresh_exchange(mut self, exchange: Arc<dyn RefreshExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Destination for user-facing error notifications.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Session-expired signal to update.
    #[must_use]
    pub fn auth_state(mut self, auth_state: AuthState) -> Self {
        self.auth_state = Some(auth_state);
        self
    }

    /// Custom reqwest client.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the default refresh exchange cannot be built.
    pub fn build(self) -> Result<ApiClient> {
        let store = self
            .store
            .unwrap_or_else(|| LocalStore::new(Arc::new(MemoryStorage::new())));
        let exchange: Arc<dyn RefreshExchange> = match self.exchange {
            Some(exchange) => exchange,
            None => Arc::new(AuthClient::new(self.config.auth_config())?),
        };
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingSink));
        let auth_state = self.auth_state.unwrap_or_default();

        let refresh = Arc::new(RefreshCoordinator::new(
            store.clone(),
            exchange,
            auth_state.clone(),
            self.config.expiry_buffer(),
        ));

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http: self.http.unwrap_or_default(),
                rate_limit: RateLimitWindow::new(self.config.rate_limit_cooldown()),
                cancels: CancelRegistry::new(),
                config: self.config,
                store,
                refresh,
                notifier,
                auth_state,
            }),
        })
    }
}
