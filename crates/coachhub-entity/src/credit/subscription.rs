//! Standing monthly credit grants.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A client's recurring monthly grant for one product.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientCreditSubscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// Subscribed client.
    pub client_id: Uuid,
    /// Backing `MONTHLY_TOPUP` product.
    pub product_id: Uuid,
    /// Credits granted each month.
    pub monthly_credits: i32,
    /// Whether grants are currently applied.
    pub is_active: bool,
    /// First day grants apply.
    pub starts_on: Option<NaiveDate>,
    /// Last day grants apply.
    pub ends_on: Option<NaiveDate>,
    /// `YYYY-MM` key of the last month granted.
    pub last_applied_month: Option<String>,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}
