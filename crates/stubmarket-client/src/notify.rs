//! User-facing notifications.
//!
//! The client reports failed requests through a [`NotificationSink`]. A UI
//! renders them as toasts; the CLI logs them.

use std::time::Duration;

use tokio::sync::mpsc;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information.
    Info,
    /// A completed action.
    Success,
    /// Something the user should look at.
    Warning,
    /// A failed action.
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Presentation style.
    pub severity: Severity,
    /// Auto-dismiss delay. `None` keeps the notification until dismissed.
    pub duration: Option<Duration>,
}

impl Notification {
    /// An error notification that stays until dismissed.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            duration: None,
        }
    }

    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
            duration: Some(duration),
        }
    }
}

/// Destination for user-facing notifications.
///
/// Delivery is fire-and-forget; a sink must never block the caller.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification.
    fn notify(&self, notification: Notification);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!(message = %notification.message, "Notification"),
            Severity::Warning => tracing::warn!(message = %notification.message, "Notification"),
            Severity::Info | Severity::Success => {
                tracing::info!(message = %notification.message, "Notification");
            }
        }
    }
}

/// Sink that forwards notifications to a channel, for a UI loop to drain.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver it feeds.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

/// Sink that records every notification for inspection in tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: parking_lot::Mutex<Vec<Notification>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    /// Messages of all notifications received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().iter().map(|n| n.message.clone()).collect()
    }

    /// Number of notifications received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns `true` if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
