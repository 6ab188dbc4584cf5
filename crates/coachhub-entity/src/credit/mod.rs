//! Credit account, ledger, product, submission, and subscription entities.

pub mod account;
pub mod ledger;
pub mod product;
pub mod submission;
pub mod subscription;

pub use account::ClientCreditAccount;
pub use ledger::{CreditLedgerEntry, LedgerReason, NewLedgerEntry};
pub use product::{CreditProduct, ProductMode};
pub use submission::{CreditSubmission, ReviewAction, SubmissionStatus};
pub use subscription::ClientCreditSubscription;
