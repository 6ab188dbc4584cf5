//! Booking lifecycle notifications.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the recipient's booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A seat was confirmed.
    Booked,
    /// The client joined the waitlist.
    Waitlisted,
    /// The booking was cancelled (on time or late).
    Cancelled,
    /// A waitlisted client was moved into a freed seat.
    WaitlistPromoted,
}

impl NotificationKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Waitlisted => "waitlisted",
            Self::Cancelled => "cancelled",
            Self::WaitlistPromoted => "waitlist_promoted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A best-effort notice about a committed booking change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotification {
    /// Who performed the change (client or coach), if known.
    pub actor_id: Option<Uuid>,
    /// The client whose booking changed.
    pub recipient_id: Uuid,
    /// What happened.
    pub kind: NotificationKind,
    /// Class template name.
    pub class_name: String,
    /// Session start time.
    pub starts_at: DateTime<Utc>,
    /// Location label, combining location and room when both exist.
    pub location_label: Option<String>,
    /// Timezone used to present `starts_at`.
    pub timezone: String,
    /// Waitlist position, for `waitlisted` notices.
    pub waitlist_position: Option<i32>,
}
