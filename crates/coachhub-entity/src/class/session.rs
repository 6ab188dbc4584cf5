//! Class session entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a concrete class occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Open for booking changes.
    Scheduled,
    /// Called off by the coach.
    Cancelled,
    /// Took place.
    Completed,
}

impl SessionStatus {
    /// Return the status as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete occurrence of a class template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Template this session was generated from.
    pub template_id: Uuid,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// End time.
    pub ends_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Per-session capacity override.
    pub capacity_override: Option<i32>,
    /// Substitute or assigned instructor.
    pub instructor_id: Option<Uuid>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ClassSession {
    /// Whether booking mutations are accepted.
    pub fn is_scheduled(&self) -> bool {
        self.status == SessionStatus::Scheduled
    }
}
