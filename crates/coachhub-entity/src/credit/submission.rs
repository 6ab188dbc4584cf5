//! Client-reported credit purchases awaiting review.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// Awaiting review.
    Pending,
    /// Accepted; credits granted according to the product.
    Approved,
    /// Declined; no ledger effect.
    Rejected,
}

impl SubmissionStatus {
    /// Approved or rejected submissions can never be reviewed again.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Return the status as an upper-case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewAction {
    /// Accept the purchase.
    Approve,
    /// Decline the purchase.
    Reject,
}

impl From<ReviewAction> for SubmissionStatus {
    fn from(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Approve => Self::Approved,
            ReviewAction::Reject => Self::Rejected,
        }
    }
}

/// A purchase reported by a client, verified externally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditSubmission {
    /// Unique submission identifier.
    pub id: Uuid,
    /// Reporting client.
    pub client_id: Uuid,
    /// Purchased product.
    pub product_id: Uuid,
    /// External payment reference.
    pub payment_reference: String,
    /// Client note.
    pub note: Option<String>,
    /// Review status.
    pub status: SubmissionStatus,
    /// Reviewer, once resolved.
    pub reviewed_by: Option<Uuid>,
    /// Review time, once resolved.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Credits granted by the approval.
    pub credits_applied: i64,
    /// When the submission was created.
    pub created_at: DateTime<Utc>,
    /// When the submission was last updated.
    pub updated_at: DateTime<Utc>,
}
