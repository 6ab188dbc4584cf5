//! Credit ledger: available-credit arithmetic and balance maintenance.
//!
//! The ledger is the source of truth. `client_credit_accounts.balance` is a
//! cache that is always overwritten with the recomputed live sum.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_database::repositories::LedgerRepository;
use coachhub_entity::credit::{CreditLedgerEntry, LedgerReason, NewLedgerEntry};

/// Sum of the deltas that are still live at `at`.
pub fn available_at(entries: &[CreditLedgerEntry], at: DateTime<Utc>) -> i64 {
    entries
        .iter()
        .filter(|e| e.is_live_at(at))
        .map(|e| e.delta)
        .sum()
}

/// In-memory credit positions of the clients touched by one booking action.
///
/// Loaded under the account locks, mutated by the booking state machine,
/// and drained into ledger rows before commit.
#[derive(Debug, Clone, Default)]
pub struct CreditBook {
    actor_id: Option<Uuid>,
    available: HashMap<Uuid, i64>,
    booking_net: HashMap<Uuid, i64>,
    entries: Vec<NewLedgerEntry>,
}

impl CreditBook {
    /// Build from per-client available credits and per-booking ledger nets.
    pub fn new(
        available: HashMap<Uuid, i64>,
        booking_net: HashMap<Uuid, i64>,
        actor_id: Option<Uuid>,
    ) -> Self {
        Self {
            actor_id,
            available,
            booking_net,
            entries: Vec::new(),
        }
    }

    /// Credits the client can spend right now.
    pub fn available(&self, client_id: Uuid) -> i64 {
        self.available.get(&client_id).copied().unwrap_or(0)
    }

    /// Net of every ledger row linked to the booking.
    pub fn booking_net(&self, booking_id: Uuid) -> i64 {
        self.booking_net.get(&booking_id).copied().unwrap_or(0)
    }

    /// Debit `amount` credits for a booking. Nothing is recorded on failure.
    pub fn debit_booking(&mut self, client_id: Uuid, booking_id: Uuid, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Ok(());
        }
        let available = self.available(client_id);
        if available < amount {
            return Err(AppError::insufficient_credits(amount, available));
        }

        self.post(
            NewLedgerEntry::new(client_id, -amount, LedgerReason::BookingDebit)
                .for_booking(booking_id),
        );
        Ok(())
    }

    /// Return the booking's outstanding debit, if any, and report the amount.
    ///
    /// Refunding the net of all linked rows means a second refund of the same
    /// booking cycle finds nothing left to return.
    pub fn refund_booking(&mut self, client_id: Uuid, booking_id: Uuid) -> i64 {
        let outstanding = -self.booking_net(booking_id);
        if outstanding <= 0 {
            return 0;
        }

        self.post(
            NewLedgerEntry::new(client_id, outstanding, LedgerReason::Refund)
                .for_booking(booking_id)
                .with_note("Cancelled before cutoff"),
        );
        outstanding
    }

    fn post(&mut self, entry: NewLedgerEntry) {
        let entry = entry.created_by(self.actor_id);
        *self.available.entry(entry.client_id).or_insert(0) += entry.delta;
        if let Some(booking_id) = entry.booking_id {
            *self.booking_net.entry(booking_id).or_insert(0) += entry.delta;
        }
        self.entries.push(entry);
    }

    /// Entries recorded so far, in posting order.
    pub fn entries(&self) -> &[NewLedgerEntry] {
        &self.entries
    }

    /// Clients whose ledger gained rows, ascending.
    pub fn touched_clients(&self) -> Vec<Uuid> {
        self.entries
            .iter()
            .map(|e| e.client_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Consume the book, returning the entries to append.
    pub fn into_entries(self) -> Vec<NewLedgerEntry> {
        self.entries
    }
}

/// One appended ledger row and the balance it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerPosting {
    /// The stored entry.
    pub entry: CreditLedgerEntry,
    /// Recomputed cached balance after the append.
    pub balance: i64,
}

/// Point-in-time view of a client's credits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummary {
    /// Client the summary is for.
    pub client_id: Uuid,
    /// Cached balance as last written.
    pub balance: i64,
    /// Live sum recomputed at `as_of`.
    pub available: i64,
    /// Evaluation instant.
    pub as_of: DateTime<Utc>,
    /// Newest ledger rows first.
    pub recent_entries: Vec<CreditLedgerEntry>,
}

/// Ledger write and read operations outside of booking transactions.
#[derive(Debug, Clone)]
pub struct CreditLedgerService {
    pool: PgPool,
    ledger: LedgerRepository,
}

impl CreditLedgerService {
    /// Number of rows returned by [`credit_summary`](Self::credit_summary).
    pub const SUMMARY_ENTRY_LIMIT: i64 = 20;

    /// Create a new ledger service.
    pub fn new(pool: PgPool) -> Self {
        Self {
            ledger: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    /// Append one entry inside the caller's transaction and overwrite the
    /// cached balance with the live sum at `at`.
    pub async fn add_ledger_entry(
        &self,
        conn: &mut PgConnection,
        entry: &NewLedgerEntry,
        at: DateTime<Utc>,
    ) -> AppResult<LedgerPosting> {
        self.ledger.lock_accounts(&mut *conn, &[entry.client_id]).await?;
        let stored = self.ledger.insert(&mut *conn, entry, at).await?;
        let balance = self.ledger.refresh_balance(conn, entry.client_id, at).await?;

        info!(
            client_id = %entry.client_id,
            reason = %entry.reason,
            delta = entry.delta,
            balance,
            "Ledger entry appended"
        );

        Ok(LedgerPosting {
            entry: stored,
            balance,
        })
    }

    /// Live credits of a client at `at`.
    pub async fn get_available_credits(&self, client_id: Uuid, at: DateTime<Utc>) -> AppResult<i64> {
        self.ledger.available_credits(client_id, at).await
    }

    /// Manual correction by staff.
    pub async fn admin_adjust(
        &self,
        client_id: Uuid,
        delta: i64,
        actor_id: Option<Uuid>,
        note: Option<String>,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<LedgerPosting> {
        if delta == 0 {
            return Err(AppError::validation("Adjustment delta must not be zero"));
        }
        let at = at.unwrap_or_else(Utc::now);

        let mut entry =
            NewLedgerEntry::new(client_id, delta, LedgerReason::AdminAdjust).created_by(actor_id);
        if let Some(note) = note {
            entry = entry.with_note(note);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        let posting = self.add_ledger_entry(&mut *tx, &entry, at).await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit adjustment", e)
        })?;

        Ok(posting)
    }

    /// Cached balance, live credits, and the latest ledger rows of a client.
    pub async fn credit_summary(
        &self,
        client_id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<CreditSummary> {
        let as_of = at.unwrap_or_else(Utc::now);
        let balance = self
            .ledger
            .find_account(client_id)
            .await?
            .map(|a| a.balance)
            .unwrap_or(0);
        let available = self.ledger.available_credits(client_id, as_of).await?;
        let recent_entries = self
            .ledger
            .recent_entries(client_id, Self::SUMMARY_ENTRY_LIMIT)
            .await?;

        Ok(CreditSummary {
            client_id,
            balance,
            available,
            as_of,
            recent_entries,
        })
    }
}
