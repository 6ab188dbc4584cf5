//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A booking notice recorded for delivery to a client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient client.
    pub recipient_id: Uuid,
    /// The actor who caused the change.
    pub actor_id: Option<Uuid>,
    /// Notification kind (`booked`, `waitlisted`, ...).
    pub kind: String,
    /// Class name.
    pub class_name: String,
    /// Session start time.
    pub starts_at: DateTime<Utc>,
    /// Location label.
    pub location_label: Option<String>,
    /// Presentation timezone.
    pub timezone: String,
    /// Waitlist position, if any.
    pub waitlist_position: Option<i32>,
    /// Whether the client has read this notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}
