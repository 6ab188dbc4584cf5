//! Cached credit balance per client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Materialized projection of a client's ledger. Only ever written as the
/// recomputed ledger sum.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientCreditAccount {
    /// The client.
    pub client_id: Uuid,
    /// Available credits as of `updated_at`.
    pub balance: i64,
    /// When the balance was last recomputed.
    pub updated_at: DateTime<Utc>,
}
