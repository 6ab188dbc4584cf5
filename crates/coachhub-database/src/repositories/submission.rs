//! Credit submission repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::credit::{CreditSubmission, SubmissionStatus};

/// Repository for client-reported credit purchases.
#[derive(Debug, Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    /// Create a new submission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a submission by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CreditSubmission>> {
        sqlx::query_as::<_, CreditSubmission>("SELECT * FROM credit_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find submission", e))
    }

    /// List pending submissions, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<CreditSubmission>> {
        sqlx::query_as::<_, CreditSubmission>(
            "SELECT * FROM credit_submissions WHERE status = 'PENDING' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list pending submissions", e)
        })
    }

    /// Record a new pending submission.
    pub async fn create(
        &self,
        client_id: Uuid,
        product_id: Uuid,
        payment_reference: &str,
        note: Option<&str>,
    ) -> AppResult<CreditSubmission> {
        sqlx::query_as::<_, CreditSubmission>(
            "INSERT INTO credit_submissions (id, client_id, product_id, payment_reference, note) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(product_id)
        .bind(payment_reference)
        .bind(note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create submission", e))
    }

    /// Load and lock a submission for review.
    pub async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Option<CreditSubmission>> {
        sqlx::query_as::<_, CreditSubmission>(
            "SELECT * FROM credit_submissions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock submission", e))
    }

    /// Resolve a pending submission. The `status = 'PENDING'` guard keeps a
    /// resolved row immutable even if a caller skipped the lock.
    pub async fn resolve(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: SubmissionStatus,
        reviewer_id: Uuid,
        credits_applied: i64,
        at: DateTime<Utc>,
    ) -> AppResult<Option<CreditSubmission>> {
        sqlx::query_as::<_, CreditSubmission>(
            "UPDATE credit_submissions SET status = $2, reviewed_by = $3, reviewed_at = $4, \
             credits_applied = $5, updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(reviewer_id)
        .bind(at)
        .bind(credits_applied)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve submission", e))
    }
}
