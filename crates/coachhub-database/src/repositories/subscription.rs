//! Monthly credit subscription repository implementation.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::credit::ClientCreditSubscription;

/// Repository for standing monthly grants.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// IDs of active subscriptions backed by an active `MONTHLY_TOPUP`
    /// product, in a stable order.
    pub async fn find_active_monthly_ids(&self) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT s.id FROM client_credit_subscriptions s \
             JOIN credit_products p ON p.id = s.product_id \
             WHERE s.is_active = TRUE AND p.is_active = TRUE AND p.mode = 'MONTHLY_TOPUP' \
             ORDER BY s.created_at, s.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list monthly subscriptions", e)
        })
    }

    /// Load and lock a subscription.
    pub async fn lock(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<ClientCreditSubscription>> {
        sqlx::query_as::<_, ClientCreditSubscription>(
            "SELECT * FROM client_credit_subscriptions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock subscription", e))
    }

    /// Find-or-create the subscription of a client to a product and lock it.
    /// A new subscription starts on `starts_on`; an existing one keeps its
    /// dates.
    pub async fn lock_or_create(
        &self,
        conn: &mut PgConnection,
        client_id: Uuid,
        product_id: Uuid,
        monthly_credits: i32,
        starts_on: NaiveDate,
    ) -> AppResult<ClientCreditSubscription> {
        sqlx::query(
            "INSERT INTO client_credit_subscriptions (id, client_id, product_id, monthly_credits, starts_on) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (client_id, product_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(product_id)
        .bind(monthly_credits)
        .bind(starts_on)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create subscription", e))?;

        sqlx::query_as::<_, ClientCreditSubscription>(
            "SELECT * FROM client_credit_subscriptions WHERE client_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(client_id)
        .bind(product_id)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock subscription", e))
    }

    /// Write back the mutable fields of a subscription.
    pub async fn save(
        &self,
        conn: &mut PgConnection,
        subscription: &ClientCreditSubscription,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE client_credit_subscriptions SET monthly_credits = $2, is_active = $3, \
             starts_on = $4, ends_on = $5, last_applied_month = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(subscription.id)
        .bind(subscription.monthly_credits)
        .bind(subscription.is_active)
        .bind(subscription.starts_on)
        .bind(subscription.ends_on)
        .bind(&subscription.last_applied_month)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save subscription", e))?;
        Ok(())
    }

    /// Deactivate a subscription; already-granted credits stay until expiry.
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE client_credit_subscriptions SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate subscription", e)
        })?;
        Ok(())
    }
}
