//! Class booking repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::class::ClassBooking;

/// Repository for class bookings.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a booking by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ClassBooking>> {
        sqlx::query_as::<_, ClassBooking>("SELECT * FROM class_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    /// List all bookings of a session (any status).
    pub async fn find_by_session(&self, session_id: Uuid) -> AppResult<Vec<ClassBooking>> {
        sqlx::query_as::<_, ClassBooking>(
            "SELECT * FROM class_bookings WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bookings", e))
    }

    /// List all bookings of a session inside a transaction. Call only after
    /// the session row is locked.
    pub async fn load_for_session(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
    ) -> AppResult<Vec<ClassBooking>> {
        sqlx::query_as::<_, ClassBooking>(
            "SELECT * FROM class_bookings WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load session bookings", e)
        })
    }

    /// Insert a booking or overwrite its mutable fields.
    pub async fn upsert(&self, conn: &mut PgConnection, booking: &ClassBooking) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO class_bookings (id, session_id, client_id, status, waitlist_position, \
             source, booked_by, cancelled_at, attendance_marked_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
                status = EXCLUDED.status, \
                waitlist_position = EXCLUDED.waitlist_position, \
                source = EXCLUDED.source, \
                booked_by = EXCLUDED.booked_by, \
                cancelled_at = EXCLUDED.cancelled_at, \
                attendance_marked_at = EXCLUDED.attendance_marked_at, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(booking.id)
        .bind(booking.session_id)
        .bind(booking.client_id)
        .bind(booking.status)
        .bind(booking.waitlist_position)
        .bind(booking.source)
        .bind(booking.booked_by)
        .bind(booking.cancelled_at)
        .bind(booking.attendance_marked_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save booking", e))?;
        Ok(())
    }
}
