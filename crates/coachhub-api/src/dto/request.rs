//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use coachhub_entity::class::{AttendanceOutcome, BookingSource};
use coachhub_entity::credit::ReviewAction;

fn default_notify() -> bool {
    true
}

/// Book a client into a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSessionRequest {
    /// Client being booked.
    pub client_id: Uuid,
    /// Who is entering the booking.
    #[serde(default = "default_source")]
    pub source: BookingSource,
    /// Acting user.
    pub actor_id: Option<Uuid>,
    /// Skip the booking window check.
    #[serde(default)]
    pub ignore_booking_window: bool,
    /// Seat the client without a debit.
    #[serde(default)]
    pub skip_credit_debit: bool,
    /// Publish notifications.
    #[serde(default = "default_notify")]
    pub notify: bool,
    /// Evaluation instant override.
    pub at: Option<DateTime<Utc>>,
}

fn default_source() -> BookingSource {
    BookingSource::Client
}

/// Cancel a booking or promote a waitlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingActionRequest {
    /// Acting user.
    pub actor_id: Option<Uuid>,
    /// Publish notifications.
    #[serde(default = "default_notify")]
    pub notify: bool,
    /// Evaluation instant override.
    pub at: Option<DateTime<Utc>>,
}

/// Record attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAttendanceRequest {
    /// `ATTENDED` or `NO_SHOW`.
    pub outcome: AttendanceOutcome,
    /// Acting coach.
    pub actor_id: Option<Uuid>,
    /// Evaluation instant override.
    pub at: Option<DateTime<Utc>>,
}

/// Query string of the credit summary endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditSummaryQuery {
    /// Evaluate availability at this instant.
    pub at: Option<DateTime<Utc>>,
}

/// Manual ledger correction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminAdjustRequest {
    /// Signed credit delta.
    #[validate(range(min = -100_000, max = 100_000, message = "Delta is out of range"))]
    pub delta: i64,
    /// Acting staff member.
    pub actor_id: Option<Uuid>,
    /// Reason for the adjustment.
    #[validate(length(max = 500))]
    pub note: Option<String>,
    /// Evaluation instant override.
    pub at: Option<DateTime<Utc>>,
}

/// Claim of a paid product purchase.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitPurchaseRequest {
    /// Purchasing client.
    pub client_id: Uuid,
    /// Purchased product.
    pub product_id: Uuid,
    /// External payment reference.
    #[validate(length(min = 1, max = 200, message = "Payment reference is required"))]
    pub payment_reference: String,
    /// Free-form note from the client.
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Approve or reject a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmissionRequest {
    /// `APPROVE` or `REJECT`.
    pub action: ReviewAction,
    /// Reviewing staff member.
    pub reviewer_id: Uuid,
    /// Evaluation instant override.
    pub at: Option<DateTime<Utc>>,
}

/// Trigger the monthly top-up and expiry run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyRunRequest {
    /// Run as of this instant.
    pub run_at: Option<DateTime<Utc>>,
    /// Acting operator.
    pub actor_id: Option<Uuid>,
}
