//! Class template and session repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::class::{ClassSession, ClassTemplate, SessionStatus};

/// Fields for creating a class template.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    /// Display name.
    pub name: String,
    /// Class-type tag.
    pub class_type: String,
    /// Location label.
    pub location_label: Option<String>,
    /// Room label.
    pub room_label: Option<String>,
    /// Seat capacity.
    pub capacity: Option<i32>,
    /// Waitlist flag.
    pub waitlist_enabled: bool,
    /// Waitlist capacity.
    pub waitlist_capacity: Option<i32>,
    /// Booking opens this many hours before start.
    pub booking_open_hours_before: Option<i32>,
    /// Booking closes this many minutes before start.
    pub booking_close_minutes_before: Option<i32>,
    /// Late-cancel cutoff in minutes.
    pub cancel_cutoff_minutes: Option<i32>,
    /// Credits per booking.
    pub credits_required: Option<i32>,
    /// Owning coach.
    pub coach_id: Uuid,
}

/// Repository for class templates and their sessions.
#[derive(Debug, Clone)]
pub struct ClassRepository {
    pool: PgPool,
}

impl ClassRepository {
    /// Create a new class repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a session and take a row lock on it for the rest of the
    /// transaction. Every booking mutation for the session serializes here.
    pub async fn lock_session(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<ClassSession>> {
        sqlx::query_as::<_, ClassSession>("SELECT * FROM class_sessions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock session", e))
    }

    /// Load a template with a share lock so its policy cannot change
    /// underneath an in-flight booking.
    pub async fn share_template(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<ClassTemplate>> {
        sqlx::query_as::<_, ClassTemplate>("SELECT * FROM class_templates WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load session template", e)
            })
    }

    /// Create a template.
    pub async fn create_template(&self, input: &CreateTemplate) -> AppResult<ClassTemplate> {
        sqlx::query_as::<_, ClassTemplate>(
            "INSERT INTO class_templates (id, name, class_type, location_label, room_label, \
             capacity, waitlist_enabled, waitlist_capacity, booking_open_hours_before, \
             booking_close_minutes_before, cancel_cutoff_minutes, credits_required, coach_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.class_type)
        .bind(&input.location_label)
        .bind(&input.room_label)
        .bind(input.capacity)
        .bind(input.waitlist_enabled)
        .bind(input.waitlist_capacity)
        .bind(input.booking_open_hours_before)
        .bind(input.booking_close_minutes_before)
        .bind(input.cancel_cutoff_minutes)
        .bind(input.credits_required)
        .bind(input.coach_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create template", e))
    }

    /// Create a scheduled session for a template.
    pub async fn create_session(
        &self,
        template_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        capacity_override: Option<i32>,
        instructor_id: Option<Uuid>,
    ) -> AppResult<ClassSession> {
        sqlx::query_as::<_, ClassSession>(
            "INSERT INTO class_sessions (id, template_id, starts_at, ends_at, capacity_override, instructor_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(template_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(capacity_override)
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Change a session's status.
    pub async fn set_session_status(&self, id: Uuid, status: SessionStatus) -> AppResult<()> {
        sqlx::query("UPDATE class_sessions SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update session status", e)
            })?;
        Ok(())
    }
}
