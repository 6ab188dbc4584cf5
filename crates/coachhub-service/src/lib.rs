//! # coachhub-service
//!
//! Business logic for CoachHub: the class booking engine, the credit
//! ledger, monthly top-ups, and the credit submission review workflow.
//!
//! The booking state machine and the credit arithmetic are pure and live
//! beside the transactional services that load, lock, and persist the
//! aggregates they operate on. Services follow constructor injection; all
//! dependencies are provided at construction time.

pub mod booking;
pub mod credit;
pub mod notification;
pub mod settings;

pub use booking::{BookingService, EffectivePolicy, SessionBook};
pub use credit::{CreditLedgerService, MonthlyTopupService, ReviewService};
pub use notification::NotificationDispatcher;
pub use settings::ConfigSettingsProvider;
