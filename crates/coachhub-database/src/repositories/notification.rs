//! Notification repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::events::BookingNotification;
use coachhub_core::result::AppResult;
use coachhub_entity::notification::Notification;

/// Repository for persisted booking notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a booking notification.
    pub async fn create(&self, notification: &BookingNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, recipient_id, actor_id, kind, class_name, starts_at, \
             location_label, timezone, waitlist_position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_str())
        .bind(&notification.class_name)
        .bind(notification.starts_at)
        .bind(&notification.location_label)
        .bind(&notification.timezone)
        .bind(notification.waitlist_position)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })
    }
}
