//! Persisted booking notifications.

pub mod model;

pub use model::Notification;
