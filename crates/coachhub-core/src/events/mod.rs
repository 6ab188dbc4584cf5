//! Domain events emitted by CoachHub operations.
//!
//! Events are published after a booking transaction commits and consumed
//! by the notification worker.

pub mod booking;

pub use booking::{BookingNotification, NotificationKind};
