//! Client-side cooldown after the server answers HTTP 429.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Window during which new requests are refused without touching the network.
#[derive(Debug)]
pub struct RateLimitWindow {
    cooldown: Duration,
    since: Mutex<Option<Instant>>,
}

impl RateLimitWindow {
    /// Create an inactive window with the given cooldown.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            since: Mutex::new(None),
        }
    }

    /// Start (or restart) the cooldown now.
    pub fn trip(&self) {
        *self.since.lock() = Some(Instant::now());
        tracing::warn!(cooldown = ?self.cooldown, "Rate limited by server");
    }

    /// End the cooldown early.
    pub fn clear(&self) {
        *self.since.lock() = None;
    }

    /// Whether requests should currently be refused.
    ///
    /// An elapsed window is cleared as a side effect.
    pub fn is_limited(&self) -> bool {
        let mut since = self.since.lock();
        match *since {
            Some(start) if start.elapsed() < self.cooldown => true,
            Some(_) => {
                *since = None;
                false
            }
            None => false,
        }
    }

    /// Time left in the current cooldown.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let since = *self.since.lock();
        since
            .map(|start| self.cooldown.saturating_sub(start.elapsed()))
            .filter(|left| !left.is_zero())
    }
}
