//! Notification delivery loop.
//!
//! Drains the dispatcher channel and stores each notification. Storage
//! failures are logged and the notification is dropped.

use tokio::sync::{mpsc, watch};

use coachhub_core::events::BookingNotification;
use coachhub_database::repositories::NotificationRepository;

/// Persists notifications received from the booking dispatcher.
#[derive(Debug)]
pub struct NotificationDeliveryWorker {
    repo: NotificationRepository,
}

impl NotificationDeliveryWorker {
    /// Create a new delivery worker
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    /// Run until the channel closes or the cancel signal is received.
    /// Queued notifications are flushed before returning.
    pub async fn run(
        &self,
        mut receiver: mpsc::Receiver<BookingNotification>,
        mut cancel: watch::Receiver<bool>,
    ) {
        tracing::info!("Notification delivery worker started");

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Notification delivery worker received shutdown signal");
                        break;
                    }
                }
                received = receiver.recv() => {
                    match received {
                        Some(notification) => self.deliver(notification).await,
                        None => {
                            tracing::info!("Notification channel closed");
                            return;
                        }
                    }
                }
            }
        }

        receiver.close();
        while let Some(notification) = receiver.recv().await {
            self.deliver(notification).await;
        }
        tracing::info!("Notification delivery worker stopped");
    }

    async fn deliver(&self, notification: BookingNotification) {
        match self.repo.create(&notification).await {
            Ok(stored) => tracing::debug!(
                notification_id = %stored.id,
                recipient_id = %stored.recipient_id,
                kind = %stored.kind,
                "Notification stored"
            ),
            Err(e) => tracing::warn!(
                recipient_id = %notification.recipient_id,
                kind = %notification.kind,
                error = %e,
                "Failed to store notification"
            ),
        }
    }
}
