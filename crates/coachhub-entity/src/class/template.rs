//! Class template entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recurring class definition. Policy fields left `None` fall back to
/// the system defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassTemplate {
    /// Unique template identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Class-type tag, matched against product eligibility.
    pub class_type: String,
    /// Location label (studio, gym, etc.).
    pub location_label: Option<String>,
    /// Room label within the location.
    pub room_label: Option<String>,
    /// Seat capacity.
    pub capacity: Option<i32>,
    /// Whether clients may queue once seats run out.
    pub waitlist_enabled: bool,
    /// Maximum waitlist length.
    pub waitlist_capacity: Option<i32>,
    /// Hours before start at which booking opens.
    pub booking_open_hours_before: Option<i32>,
    /// Minutes before start at which booking closes.
    pub booking_close_minutes_before: Option<i32>,
    /// Minutes before start after which a cancellation is late.
    pub cancel_cutoff_minutes: Option<i32>,
    /// Credits debited per booking.
    pub credits_required: Option<i32>,
    /// Owning coach.
    pub coach_id: Uuid,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// When the template was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ClassTemplate {
    /// Location and room joined for display, e.g. `"Main Studio · Room 2"`.
    pub fn location_display(&self) -> Option<String> {
        match (self.location_label.as_deref(), self.room_label.as_deref()) {
            (Some(loc), Some(room)) => Some(format!("{loc} · {room}")),
            (Some(loc), None) => Some(loc.to_string()),
            (None, Some(room)) => Some(room.to_string()),
            (None, None) => None,
        }
    }
}
