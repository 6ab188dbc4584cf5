//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether scheduled jobs run inside the server process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the monthly top-up and expiry job.
    #[serde(default = "default_topup_cron")]
    pub credit_topup_cron: String,
    /// Capacity of the outbound notification channel.
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            credit_topup_cron: default_topup_cron(),
            notification_buffer: default_notification_buffer(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_topup_cron() -> String {
    "0 10 0 * * *".to_string()
}

fn default_notification_buffer() -> usize {
    1024
}
