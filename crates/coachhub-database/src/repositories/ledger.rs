//! Credit ledger and cached account repository implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::credit::{ClientCreditAccount, CreditLedgerEntry, NewLedgerEntry};

/// Sum of live deltas; shared by every balance query.
const AVAILABLE_SUM: &str = "COALESCE(SUM(delta) FILTER (WHERE expires_at IS NULL OR expires_at > $2), 0)::BIGINT";

/// Repository for the append-only ledger and the cached balances.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new ledger repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one ledger row. Rows are never updated afterwards.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        entry: &NewLedgerEntry,
        at: DateTime<Utc>,
    ) -> AppResult<CreditLedgerEntry> {
        sqlx::query_as::<_, CreditLedgerEntry>(
            "INSERT INTO client_credit_ledger (id, client_id, delta, reason, expires_at, booking_id, \
             submission_id, product_id, subscription_id, period_key, note, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(entry.client_id)
        .bind(entry.delta)
        .bind(entry.reason)
        .bind(entry.expires_at)
        .bind(entry.booking_id)
        .bind(entry.submission_id)
        .bind(entry.product_id)
        .bind(entry.subscription_id)
        .bind(&entry.period_key)
        .bind(&entry.note)
        .bind(entry.created_by)
        .bind(at)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append ledger entry", e)
        })
    }

    /// Make sure account rows exist and lock them, in ascending client order
    /// so concurrent transactions always acquire them in the same sequence.
    pub async fn lock_accounts(&self, conn: &mut PgConnection, client_ids: &[Uuid]) -> AppResult<()> {
        let mut ids = client_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO client_credit_accounts (client_id, balance) \
             SELECT id, 0 FROM UNNEST($1::UUID[]) AS t(id) ORDER BY id \
             ON CONFLICT (client_id) DO NOTHING",
        )
        .bind(&ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create credit accounts", e)
        })?;

        sqlx::query(
            "SELECT client_id FROM client_credit_accounts WHERE client_id = ANY($1) \
             ORDER BY client_id FOR UPDATE",
        )
        .bind(&ids)
        .execute(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to lock credit accounts", e)
        })?;
        Ok(())
    }

    /// Available credits for several clients at `at`, summed from the ledger.
    /// Clients without entries map to zero.
    pub async fn available_for(
        &self,
        conn: &mut PgConnection,
        client_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> AppResult<HashMap<Uuid, i64>> {
        let sql = format!(
            "SELECT client_id, {AVAILABLE_SUM} FROM client_credit_ledger \
             WHERE client_id = ANY($1) GROUP BY client_id"
        );
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(&sql)
            .bind(client_ids)
            .bind(at)
            .fetch_all(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to sum available credits", e)
            })?;

        let mut available: HashMap<Uuid, i64> = client_ids.iter().map(|id| (*id, 0)).collect();
        available.extend(rows);
        Ok(available)
    }

    /// Available credits for one client at `at`, read outside a transaction.
    pub async fn available_credits(&self, client_id: Uuid, at: DateTime<Utc>) -> AppResult<i64> {
        let sql =
            format!("SELECT {AVAILABLE_SUM} FROM client_credit_ledger WHERE client_id = $1");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(client_id)
            .bind(at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to sum available credits", e)
            })
    }

    /// Net delta of all entries linked to each booking. A negative value is
    /// the outstanding debit that a refund would return.
    pub async fn booking_net(
        &self,
        conn: &mut PgConnection,
        booking_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, i64>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT booking_id, COALESCE(SUM(delta), 0)::BIGINT FROM client_credit_ledger \
             WHERE booking_id = ANY($1) GROUP BY booking_id",
        )
        .bind(booking_ids)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sum booking ledger", e)
        })?;
        Ok(rows.into_iter().collect())
    }

    /// Recompute and overwrite the cached balance from the ledger.
    pub async fn refresh_balance(
        &self,
        conn: &mut PgConnection,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        let sql = format!(
            "INSERT INTO client_credit_accounts (client_id, balance, updated_at) \
             SELECT $1, {AVAILABLE_SUM}, NOW() FROM client_credit_ledger WHERE client_id = $1 \
             ON CONFLICT (client_id) DO UPDATE SET balance = EXCLUDED.balance, updated_at = NOW() \
             RETURNING balance"
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(client_id)
            .bind(at)
            .fetch_one(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to refresh credit balance", e)
            })
    }

    /// Find the cached account of a client.
    pub async fn find_account(&self, client_id: Uuid) -> AppResult<Option<ClientCreditAccount>> {
        sqlx::query_as::<_, ClientCreditAccount>(
            "SELECT * FROM client_credit_accounts WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find credit account", e))
    }

    /// Most recent ledger rows of a client.
    pub async fn recent_entries(
        &self,
        client_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<CreditLedgerEntry>> {
        sqlx::query_as::<_, CreditLedgerEntry>(
            "SELECT * FROM client_credit_ledger WHERE client_id = $1 \
             ORDER BY created_at DESC, id LIMIT $2",
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list ledger entries", e))
    }

    /// All ledger rows linked to a booking, oldest first.
    pub async fn find_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<CreditLedgerEntry>> {
        sqlx::query_as::<_, CreditLedgerEntry>(
            "SELECT * FROM client_credit_ledger WHERE booking_id = $1 ORDER BY created_at, id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list booking ledger entries", e)
        })
    }

    /// Distinct clients owning at least one entry expired at `at`.
    pub async fn clients_with_expired_entries(&self, at: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT client_id FROM client_credit_ledger \
             WHERE expires_at IS NOT NULL AND expires_at <= $1 ORDER BY client_id",
        )
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find expired credits", e)
        })
    }
}
