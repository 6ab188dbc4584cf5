//! Channel-backed booking notifier.
//!
//! The booking service hands notifications over after commit; a worker on
//! the receiving end persists them. Publishing never blocks and never fails
//! the caller.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use coachhub_core::events::BookingNotification;
use coachhub_core::traits::BookingNotifier;

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<BookingNotification>,
}

impl NotificationDispatcher {
    /// Create a dispatcher and the receiver its worker drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<BookingNotification>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

impl BookingNotifier for NotificationDispatcher {
    fn notify(&self, notification: BookingNotification) {
        let recipient_id = notification.recipient_id;
        let kind = notification.kind;
        match self.sender.try_send(notification) {
            Ok(()) => debug!(%recipient_id, %kind, "Notification queued"),
            Err(TrySendError::Full(_)) => {
                warn!(%recipient_id, %kind, "Notification channel full, dropping notification");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%recipient_id, %kind, "Notification channel closed, dropping notification");
            }
        }
    }
}
