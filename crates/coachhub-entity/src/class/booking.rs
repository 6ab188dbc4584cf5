//! Class booking entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status of a client's booking for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Holds a seat.
    Booked,
    /// Queued for a seat.
    Waitlisted,
    /// Cancelled before the cutoff (or from the waitlist).
    Cancelled,
    /// Cancelled inside the no-refund window.
    LateCancel,
    /// Attended the session.
    Attended,
    /// Did not show up.
    NoShow,
}

impl BookingStatus {
    /// `BOOKED` or `WAITLISTED`.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Booked | Self::Waitlisted)
    }

    /// `CANCELLED` or `LATE_CANCEL`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::LateCancel)
    }

    /// Attendance outcomes can never be changed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Attended | Self::NoShow)
    }

    /// Whether this booking occupies one of the session's seats.
    pub fn consumes_seat(&self) -> bool {
        matches!(self, Self::Booked | Self::Attended | Self::NoShow)
    }

    /// Return the status as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "BOOKED",
            Self::Waitlisted => "WAITLISTED",
            Self::Cancelled => "CANCELLED",
            Self::LateCancel => "LATE_CANCEL",
            Self::Attended => "ATTENDED",
            Self::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who entered the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingSource {
    /// Client self-service.
    Client,
    /// Entered by a coach on the client's behalf.
    Coach,
}

/// Attendance outcome recorded after a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceOutcome {
    /// The client attended.
    Attended,
    /// The client did not show up.
    NoShow,
}

impl From<AttendanceOutcome> for BookingStatus {
    fn from(outcome: AttendanceOutcome) -> Self {
        match outcome {
            AttendanceOutcome::Attended => Self::Attended,
            AttendanceOutcome::NoShow => Self::NoShow,
        }
    }
}

/// The single booking record for a (session, client) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClassBooking {
    /// Unique booking identifier.
    pub id: Uuid,
    /// Session being booked.
    pub session_id: Uuid,
    /// Booking client.
    pub client_id: Uuid,
    /// Current status.
    pub status: BookingStatus,
    /// Position in the waitlist, only while `WAITLISTED`.
    pub waitlist_position: Option<i32>,
    /// Who entered the booking.
    pub source: BookingSource,
    /// Actor who last booked this record.
    pub booked_by: Option<Uuid>,
    /// When the booking was last cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When attendance was marked.
    pub attendance_marked_at: Option<DateTime<Utc>>,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ClassBooking {
    /// Create a fresh, not-yet-persisted booking record.
    pub fn new(
        session_id: Uuid,
        client_id: Uuid,
        status: BookingStatus,
        source: BookingSource,
        booked_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            client_id,
            status,
            waitlist_position: None,
            source,
            booked_by,
            cancelled_at: None,
            attendance_marked_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
