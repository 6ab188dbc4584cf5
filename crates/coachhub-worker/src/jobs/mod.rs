//! Built-in job implementations.

pub mod credit_topup;
pub mod notification;

pub use credit_topup::CreditTopupJobHandler;
pub use notification::NotificationDeliveryWorker;
