//! Outbound booking notifications.

pub mod dispatcher;

pub use dispatcher::NotificationDispatcher;
