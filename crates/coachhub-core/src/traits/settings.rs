//! System settings provider trait.

use async_trait::async_trait;

use crate::config::BookingDefaults;
use crate::result::AppResult;

/// Supplies system-wide booking defaults to the booking engine.
///
/// Implementations may read from static configuration or from a settings
/// table; the engine calls this once per operation, before opening its
/// transaction.
#[async_trait]
pub trait SettingsProvider: Send + Sync + 'static {
    /// Current default policy numbers and booking timezone.
    async fn booking_defaults(&self) -> AppResult<BookingDefaults>;
}
