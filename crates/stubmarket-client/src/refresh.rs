//! Single-flight access token refresh.
//!
//! When a request finds the stored access token stale it joins a FIFO queue
//! of waiters. The first one to join starts a detached refresh task; every
//! other caller waits for the same outcome. Only one refresh exchange is in
//! flight at a time, and every waiter of a round receives the same token.
//!
//! ```text
//!  request ──▶ valid_token ──fresh──▶ Some(token)
//!                  │
//!                stale
//!                  ▼
//!            ┌───────────┐  first   ┌─────────────┐
//!            │ enqueue   │────────▶ │ refresh task│──▶ RefreshExchange
//!            └─────┬─────┘          └──────┬──────┘
//!                  │ oneshot               │ settle (FIFO)
//!                  ◀───────────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use stubmarket_auth::{token, RefreshExchange};
use stubmarket_store::LocalStore;
use tokio::sync::oneshot;

use crate::auth_state::AuthState;
use crate::error::{ApiError, Result};

type Waiter = oneshot::Sender<Result<String>>;

#[derive(Default)]
struct State {
    refreshing: bool,
    waiters: VecDeque<Waiter>,
}

/// Coordinates token refresh across concurrent requests.
pub struct RefreshCoordinator {
    state: Mutex<State>,
    store: LocalStore,
    exchange: Arc<dyn RefreshExchange>,
    auth_state: AuthState,
    buffer: Duration,
}

impl RefreshCoordinator {
    /// Create a coordinator.
    ///
    /// `buffer` is how close to expiry a token may be before it is refreshed.
    #[must_use]
    pub fn new(
        store: LocalStore,
        exchange: Arc<dyn RefreshExchange>,
        auth_state: AuthState,
        buffer: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(State::default()),
            store,
            exchange,
            auth_state,
            buffer,
        }
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// The access token to send with the next request.
    ///
    /// Returns `None` when no token is stored (anonymous request). A stale
    /// token is refreshed first.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` if there is no refresh token or the exchange
    /// fails, and `Unexpected` if storage cannot be read.
    pub async fn valid_token(self: &Arc<Self>) -> Result<Option<String>> {
        let Some(access) = self.store.access_token()? else {
            return Ok(None);
        };

        if token::is_fresh(&access, Utc::now(), self.buffer) {
            return Ok(Some(access));
        }

        let rx = self.enqueue();
        match rx.await {
            Ok(outcome) => outcome.map(Some),
            Err(_) => Err(ApiError::Unexpected(
                "token refresh ended without an outcome".to_string(),
            )),
        }
    }

    fn enqueue(self: &Arc<Self>) -> oneshot::Receiver<Result<String>> {
        let (tx, rx) = oneshot::channel();

        let lead = {
            let mut state = self.state.lock();
            state.waiters.push_back(tx);
            !std::mem::replace(&mut state.refreshing, true)
        };

        if lead {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.lead().await });
        }

        rx
    }

    async fn lead(&self) {
        let guard = SettleGuard {
            coordinator: self,
            armed: true,
        };
        let outcome = self.exchange_once().await;
        guard.settle(outcome);
    }

    async fn exchange_once(&self) -> Result<String> {
        // A previous round may have stored a fresh token already
        if let Some(access) = self.store.access_token()? {
            if token::is_fresh(&access, Utc::now(), self.buffer) {
                return Ok(access);
            }
        }

        let Some(refresh_token) = self.store.refresh_token()? else {
            tracing::info!("No refresh token stored");
            self.auth_state.mark_expired();
            return Err(ApiError::SessionExpired(
                "no refresh token available".to_string(),
            ));
        };

        tracing::debug!("Refreshing access token");
        match self.exchange.refresh(&refresh_token).await {
            Ok(credentials) => {
                self.store.save_credentials(&credentials)?;
                tracing::debug!("Access token refreshed");
                Ok(credentials.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                if !e.is_retriable() {
                    self.store.clear_credentials()?;
                }
                self.auth_state.mark_expired();
                Err(ApiError::SessionExpired(e.to_string()))
            }
        }
    }

    /// Clear the flag and hand `outcome` to every waiter, oldest first.
    fn settle(&self, outcome: &Result<String>) {
        let waiters = {
            let mut state = self.state.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        tracing::debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Refresh settled");
        for waiter in waiters {
            // The requester may have been dropped meanwhile
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &state.refreshing)
            .field("waiters", &state.waiters.len())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

/// Settles the waiters if the refresh task ends without an outcome (panic,
/// runtime shutdown).
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl SettleGuard<'_> {
    fn settle(mut self, outcome: Result<String>) {
        self.armed = false;
        self.coordinator.settle(&outcome);
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Token refresh abandoned");
            self.coordinator.settle(&Err(ApiError::Unexpected(
                "token refresh abandoned".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use stubmarket_auth::{AuthError, MockRefreshExchange};
    use stubmarket_store::{Credentials, MemoryStorage};

    const BUFFER: Duration = Duration::from_secs(300);

    #[derive(Serialize)]
    struct Claims {
        exp: i64,
    }

    fn token_expiring_in(secs: i64) -> String {
        encode(
            &Header::default(),
            &Claims {
                exp: Utc::now().timestamp() + secs,
            },
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap()
    }

    fn store_with(access: Option<&str>, refresh: Option<&str>) -> LocalStore {
        let store = LocalStore::new(Arc::new(MemoryStorage::new()));
        if let Some(access) = access {
            store.save_access_token(access).unwrap();
        }
        if let Some(refresh) = refresh {
            store.save_refresh_token(refresh).unwrap();
        }
        store
    }

    fn coordinator(
        store: LocalStore,
        exchange: Arc<dyn RefreshExchange>,
        auth_state: AuthState,
    ) -> Arc<RefreshCoordinator> {
        Arc::new(RefreshCoordinator::new(store, exchange, auth_state, BUFFER))
    }

    #[tokio::test]
    async fn no_token_is_anonymous() {
        let mock = Arc::new(MockRefreshExchange::failing("unused"));
        let c = coordinator(store_with(None, None), mock.clone(), AuthState::new());

        assert_eq!(c.valid_token().await.unwrap(), None);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn fresh_token_is_used_as_is() {
        let fresh = token_expiring_in(3600);
        let mock = Arc::new(MockRefreshExchange::failing("unused"));
        let c = coordinator(
            store_with(Some(&fresh), Some("r")),
            mock.clone(),
            AuthState::new(),
        );

        assert_eq!(c.valid_token().await.unwrap(), Some(fresh));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let new_access = token_expiring_in(3600);
        let mock = Arc::new(
            MockRefreshExchange::succeeding(Credentials::new(&new_access, "r-2"))
                .with_delay(Duration::from_millis(50)),
        );
        let store = store_with(Some(&token_expiring_in(60)), Some("r-1"));
        let c = coordinator(store.clone(), mock.clone(), AuthState::new());

        let results = futures::future::join_all((0..5).map(|_| {
            let c = Arc::clone(&c);
            async move { c.valid_token().await }
        }))
        .await;

        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.seen_tokens(), vec!["r-1".to_string()]);
        for result in results {
            assert_eq!(result.unwrap().as_deref(), Some(new_access.as_str()));
        }
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r-2"));
        assert!(!c.is_refreshing());
    }

    #[tokio::test]
    async fn missing_refresh_token_expires_session() {
        let auth_state = AuthState::new();
        let mock = Arc::new(MockRefreshExchange::failing("unused"));
        let c = coordinator(
            store_with(Some(&token_expiring_in(-10)), None),
            mock.clone(),
            auth_state.clone(),
        );

        let err = c.valid_token().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired(_)));
        assert!(auth_state.is_expired());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_refresh_clears_credentials() {
        let auth_state = AuthState::new();
        let store = store_with(Some(&token_expiring_in(10)), Some("revoked"));
        let c = coordinator(
            store.clone(),
            Arc::new(MockRefreshExchange::failing("revoked")),
            auth_state.clone(),
        );

        let err = c.valid_token().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired(_)));
        assert!(auth_state.is_expired());
        assert!(store.access_token().unwrap().is_none());
        assert!(store.refresh_token().unwrap().is_none());
        assert!(!c.is_refreshing());
    }

    #[tokio::test]
    async fn rejected_refresh_fails_every_waiter() {
        let auth_state = AuthState::new();
        let mock = Arc::new(
            MockRefreshExchange::failing("revoked").with_delay(Duration::from_millis(50)),
        );
        let c = coordinator(
            store_with(Some(&token_expiring_in(10)), Some("revoked")),
            mock.clone(),
            auth_state.clone(),
        );

        let results = futures::future::join_all((0..4).map(|_| {
            let c = Arc::clone(&c);
            async move { c.valid_token().await }
        }))
        .await;

        assert_eq!(mock.calls(), 1);
        assert_eq!(results.len(), 4);
        for result in results {
            assert!(matches!(result, Err(ApiError::SessionExpired(_))));
        }
        assert!(auth_state.is_expired());
        assert!(!c.is_refreshing());
    }

    struct Unreachable;

    #[async_trait]
    impl RefreshExchange for Unreachable {
        async fn refresh(&self, _refresh_token: &str) -> stubmarket_auth::Result<Credentials> {
            Err(AuthError::Request("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn transport_failure_keeps_refresh_token() {
        let store = store_with(Some(&token_expiring_in(10)), Some("r-1"));
        let c = coordinator(store.clone(), Arc::new(Unreachable), AuthState::new());

        assert!(matches!(
            c.valid_token().await,
            Err(ApiError::SessionExpired(_))
        ));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r-1"));
    }

    struct Panicking;

    #[async_trait]
    impl RefreshExchange for Panicking {
        async fn refresh(&self, _refresh_token: &str) -> stubmarket_auth::Result<Credentials> {
            panic!("exchange blew up");
        }
    }

    #[tokio::test]
    async fn abandoned_refresh_releases_waiters() {
        let c = coordinator(
            store_with(Some(&token_expiring_in(10)), Some("r-1")),
            Arc::new(Panicking),
            AuthState::new(),
        );

        let err = c.valid_token().await.unwrap_err();
        assert!(matches!(err, ApiError::Unexpected(_)));
        assert!(!c.is_refreshing());
    }
}
