//! Keyed, supersedable requests.
//!
//! Each operation key owns at most one in-flight request. Registering a new
//! request under a key aborts the one it replaces.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::future::{AbortHandle, AbortRegistration, BoxFuture};
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Registry of the request currently running under each operation key.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    next_id: AtomicU64,
    inflight: Mutex<HashMap<String, (u64, AbortHandle)>>,
}

impl CancelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for a new request, aborting whatever held it before.
    ///
    /// Returns the ticket to pass to [`release`](Self::release) once the
    /// request settles.
    pub fn register(&self, key: &str) -> (u64, AbortHandle, AbortRegistration) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, registration) = AbortHandle::new_pair();

        let previous = self
            .inflight
            .lock()
            .insert(key.to_string(), (id, handle.clone()));

        if let Some((_, previous)) = previous {
            tracing::debug!(key = %key, "Superseding in-flight request");
            previous.abort();
        }

        (id, handle, registration)
    }

    /// Drop the entry for `key` if it still belongs to request `id`.
    pub fn release(&self, key: &str, id: u64) {
        let mut inflight = self.inflight.lock();
        if inflight.get(key).is_some_and(|(owner, _)| *owner == id) {
            inflight.remove(key);
        }
    }

    /// Number of keys with a request in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Returns `true` if no keyed request is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inflight.lock().is_empty()
    }
}

/// A request that can be canceled while it runs.
///
/// Await it for the result. `cancel()` makes a pending result resolve to
/// [`ApiError::Canceled`](crate::ApiError::Canceled); after the result has
/// settled it does nothing.
pub struct Cancelable {
    result: BoxFuture<'static, Result<Value>>,
    handle: CancelHandle,
}

impl Cancelable {
    pub(crate) fn new(result: BoxFuture<'static, Result<Value>>, handle: AbortHandle) -> Self {
        Self {
            result,
            handle: CancelHandle(handle),
        }
    }

    /// Cancel the request.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// A detached handle that can cancel the request from elsewhere.
    #[must_use]
    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// The pending result.
    pub fn result(self) -> BoxFuture<'static, Result<Value>> {
        self.result
    }
}

impl Future for Cancelable {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.result.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for Cancelable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancelable")
            .field("canceled", &self.handle.is_canceled())
            .finish_non_exhaustive()
    }
}

/// Cancels a [`Cancelable`]. Idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    /// Cancel the request.
    pub fn cancel(&self) {
        self.0.abort();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.is_aborted()
    }
}
