//! System-wide booking policy defaults.

use serde::{Deserialize, Serialize};

/// Default policy numbers applied when a class template leaves a field
/// unset. Every numeric field is optional; unset values fall through to
/// the resolver's built-in fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDefaults {
    /// Default seat capacity per session.
    #[serde(default)]
    pub capacity: Option<i32>,
    /// Default waitlist capacity per session.
    #[serde(default)]
    pub waitlist_capacity: Option<i32>,
    /// How many hours before start booking opens.
    #[serde(default)]
    pub booking_open_hours_before: Option<i32>,
    /// How many minutes before start booking closes.
    #[serde(default)]
    pub booking_close_minutes_before: Option<i32>,
    /// Minutes before start after which a cancellation is late.
    #[serde(default)]
    pub cancel_cutoff_minutes: Option<i32>,
    /// Credits debited per booking.
    #[serde(default)]
    pub credits_per_booking: Option<i32>,
    /// IANA timezone name used when presenting session times.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self {
            capacity: None,
            waitlist_capacity: None,
            booking_open_hours_before: None,
            booking_close_minutes_before: None,
            cancel_cutoff_minutes: None,
            credits_per_booking: None,
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}
