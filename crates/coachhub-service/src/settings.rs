//! Configuration-backed system settings.

use async_trait::async_trait;

use coachhub_core::config::BookingDefaults;
use coachhub_core::result::AppResult;
use coachhub_core::traits::SettingsProvider;

/// Serves the `[booking]` section of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSettingsProvider {
    defaults: BookingDefaults,
}

impl ConfigSettingsProvider {
    pub fn new(defaults: BookingDefaults) -> Self {
        Self { defaults }
    }
}

#[async_trait]
impl SettingsProvider for ConfigSettingsProvider {
    async fn booking_defaults(&self) -> AppResult<BookingDefaults> {
        Ok(self.defaults.clone())
    }
}
