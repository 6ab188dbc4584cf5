//! Outbound booking notification trait.

use crate::events::BookingNotification;

/// Best-effort, fire-and-forget sink for booking notifications.
///
/// Called strictly after the booking transaction commits. Implementations
/// must not block and must swallow (and log) their own failures.
pub trait BookingNotifier: Send + Sync + 'static {
    /// Publish one notification.
    fn notify(&self, notification: BookingNotification);
}
