//! Credit ledger arithmetic, monthly top-ups, and purchase review.

pub mod ledger;
pub mod review;
pub mod topup;

pub use ledger::{CreditBook, CreditLedgerService, CreditSummary, LedgerPosting, available_at};
pub use review::{ApprovalGrant, ReviewOutcome, ReviewService, plan_approval};
pub use topup::{MonthlyTopupService, TopupMarker, TopupRunReport, should_apply_monthly_topup};
