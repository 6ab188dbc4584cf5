//! Repository implementations for all CoachHub entities.

pub mod booking;
pub mod class;
pub mod ledger;
pub mod notification;
pub mod product;
pub mod submission;
pub mod subscription;

pub use booking::BookingRepository;
pub use class::ClassRepository;
pub use ledger::LedgerRepository;
pub use notification::NotificationRepository;
pub use product::ProductRepository;
pub use submission::SubmissionRepository;
pub use subscription::SubscriptionRepository;
