//! Append-only credit ledger entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerReason {
    /// Credits spent on a booking or waitlist promotion.
    BookingDebit,
    /// Credits returned for an on-time cancellation.
    Refund,
    /// One-time credit pack.
    PackPurchase,
    /// Recurring monthly grant.
    TopupMonthly,
    /// Manual correction by staff.
    AdminAdjust,
}

impl LedgerReason {
    /// Return the reason as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingDebit => "BOOKING_DEBIT",
            Self::Refund => "REFUND",
            Self::PackPurchase => "PACK_PURCHASE",
            Self::TopupMonthly => "TOPUP_MONTHLY",
            Self::AdminAdjust => "ADMIN_ADJUST",
        }
    }
}

impl fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable signed credit movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CreditLedgerEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Owning client.
    pub client_id: Uuid,
    /// Signed credit delta.
    pub delta: i64,
    /// Why the entry exists.
    pub reason: LedgerReason,
    /// When these credits stop counting (`None` = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Booking that produced the entry.
    pub booking_id: Option<Uuid>,
    /// Submission that produced the entry.
    pub submission_id: Option<Uuid>,
    /// Product that produced the entry.
    pub product_id: Option<Uuid>,
    /// Subscription that produced the entry.
    pub subscription_id: Option<Uuid>,
    /// Month key for monthly grants.
    pub period_key: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
    /// Actor who caused the entry.
    pub created_by: Option<Uuid>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl CreditLedgerEntry {
    /// Whether this entry still counts at `at`.
    pub fn is_live_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| exp > at)
    }
}

/// A ledger entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    /// Owning client.
    pub client_id: Uuid,
    /// Signed credit delta.
    pub delta: i64,
    /// Why the entry exists.
    pub reason: LedgerReason,
    /// When these credits stop counting.
    pub expires_at: Option<DateTime<Utc>>,
    /// Booking link.
    pub booking_id: Option<Uuid>,
    /// Submission link.
    pub submission_id: Option<Uuid>,
    /// Product link.
    pub product_id: Option<Uuid>,
    /// Subscription link.
    pub subscription_id: Option<Uuid>,
    /// Month key for monthly grants.
    pub period_key: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
    /// Actor.
    pub created_by: Option<Uuid>,
}

impl NewLedgerEntry {
    /// An entry with only the required fields set.
    pub fn new(client_id: Uuid, delta: i64, reason: LedgerReason) -> Self {
        Self {
            client_id,
            delta,
            reason,
            expires_at: None,
            booking_id: None,
            submission_id: None,
            product_id: None,
            subscription_id: None,
            period_key: None,
            note: None,
            created_by: None,
        }
    }

    /// Link to a booking.
    pub fn for_booking(mut self, booking_id: Uuid) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    /// Link to a submission.
    pub fn for_submission(mut self, submission_id: Uuid) -> Self {
        self.submission_id = Some(submission_id);
        self
    }

    /// Link to a product.
    pub fn for_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Link to a subscription and month.
    pub fn for_subscription(mut self, subscription_id: Uuid, period_key: String) -> Self {
        self.subscription_id = Some(subscription_id);
        self.period_key = Some(period_key);
        self
    }

    /// Set the expiry.
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Set the actor.
    pub fn created_by(mut self, actor_id: Option<Uuid>) -> Self {
        self.created_by = actor_id;
        self
    }
}
