//! Observable "session expired" flag.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared signal telling the UI the user must authenticate again.
///
/// Clones observe and update the same flag.
#[derive(Debug, Clone)]
pub struct AuthState {
    tx: Arc<watch::Sender<bool>>,
}

impl AuthState {
    /// Create a flag in the "not expired" state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Flag the session as expired.
    pub fn mark_expired(&self) {
        if !self.tx.send_replace(true) {
            tracing::info!("Session expired");
        }
    }

    /// Clear the flag after a successful login.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Whether the session is currently flagged as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Watch the flag for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
