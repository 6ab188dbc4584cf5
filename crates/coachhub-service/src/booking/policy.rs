//! Effective booking policy resolution.
//!
//! A template field wins when set, then the system default, then the
//! built-in fallback below.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use coachhub_core::config::BookingDefaults;
use coachhub_entity::class::ClassTemplate;

const FALLBACK_CAPACITY: i32 = 10;
const FALLBACK_WAITLIST_CAPACITY: i32 = 0;
const FALLBACK_BOOKING_OPEN_HOURS: i32 = 24 * 14;
const FALLBACK_BOOKING_CLOSE_MINUTES: i32 = 0;
const FALLBACK_CANCEL_CUTOFF_MINUTES: i32 = 12 * 60;
const FALLBACK_CREDITS_PER_BOOKING: i32 = 1;

/// Fully resolved capacity and window parameters for one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePolicy {
    /// Seats per session (before any session override).
    pub capacity: i32,
    /// Whether clients may queue when seats run out.
    pub waitlist_enabled: bool,
    /// Maximum waitlist length.
    pub waitlist_capacity: i32,
    /// Booking opens this many hours before start.
    pub booking_open_hours_before: i32,
    /// Booking closes this many minutes before start.
    pub booking_close_minutes_before: i32,
    /// Cancellations at or after `start - cutoff` are late.
    pub cancel_cutoff_minutes: i32,
    /// Credits debited per booking.
    pub credits_per_booking: i32,
}

/// Merge a template's policy fields with the system defaults.
pub fn resolve_policy(template: &ClassTemplate, defaults: &BookingDefaults) -> EffectivePolicy {
    let pick = |own: Option<i32>, system: Option<i32>, fallback: i32| {
        own.or(system).unwrap_or(fallback).max(0)
    };

    EffectivePolicy {
        capacity: pick(template.capacity, defaults.capacity, FALLBACK_CAPACITY),
        waitlist_enabled: template.waitlist_enabled,
        waitlist_capacity: pick(
            template.waitlist_capacity,
            defaults.waitlist_capacity,
            FALLBACK_WAITLIST_CAPACITY,
        ),
        booking_open_hours_before: pick(
            template.booking_open_hours_before,
            defaults.booking_open_hours_before,
            FALLBACK_BOOKING_OPEN_HOURS,
        ),
        booking_close_minutes_before: pick(
            template.booking_close_minutes_before,
            defaults.booking_close_minutes_before,
            FALLBACK_BOOKING_CLOSE_MINUTES,
        ),
        cancel_cutoff_minutes: pick(
            template.cancel_cutoff_minutes,
            defaults.cancel_cutoff_minutes,
            FALLBACK_CANCEL_CUTOFF_MINUTES,
        ),
        credits_per_booking: pick(
            template.credits_required,
            defaults.credits_per_booking,
            FALLBACK_CREDITS_PER_BOOKING,
        ),
    }
}

/// The half-open interval `[opens_at, closes_at)` in which booking is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWindow {
    /// First instant at which booking is accepted.
    pub opens_at: DateTime<Utc>,
    /// First instant at which booking is refused again.
    pub closes_at: DateTime<Utc>,
}

impl BookingWindow {
    /// Whether `now` lies inside the window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.opens_at <= now && now < self.closes_at
    }
}

impl EffectivePolicy {
    /// Booking window for a session starting at `starts_at`.
    pub fn booking_window(&self, starts_at: DateTime<Utc>) -> BookingWindow {
        BookingWindow {
            opens_at: starts_at - Duration::hours(i64::from(self.booking_open_hours_before)),
            closes_at: starts_at - Duration::minutes(i64::from(self.booking_close_minutes_before)),
        }
    }

    /// Instant from which cancellations no longer earn a refund.
    pub fn cancel_cutoff(&self, starts_at: DateTime<Utc>) -> DateTime<Utc> {
        starts_at - Duration::minutes(i64::from(self.cancel_cutoff_minutes))
    }

    /// Whether cancelling at `now` is a late cancel.
    pub fn is_late_cancel(&self, starts_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= self.cancel_cutoff(starts_at)
    }

    /// Whether the waitlist can take anyone at all.
    pub fn waitlist_available(&self) -> bool {
        self.waitlist_enabled && self.waitlist_capacity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn template() -> ClassTemplate {
        let now = Utc::now();
        ClassTemplate {
            id: Uuid::new_v4(),
            name: "Morning Mobility".to_string(),
            class_type: "mobility".to_string(),
            location_label: None,
            room_label: None,
            capacity: None,
            waitlist_enabled: true,
            waitlist_capacity: None,
            booking_open_hours_before: None,
            booking_close_minutes_before: None,
            cancel_cutoff_minutes: None,
            credits_required: None,
            coach_id: Uuid::new_v4(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_template_value_wins() {
        let mut t = template();
        t.capacity = Some(4);
        t.cancel_cutoff_minutes = Some(60);
        let defaults = BookingDefaults {
            capacity: Some(20),
            cancel_cutoff_minutes: Some(720),
            ..BookingDefaults::default()
        };

        let policy = resolve_policy(&t, &defaults);
        assert_eq!(policy.capacity, 4);
        assert_eq!(policy.cancel_cutoff_minutes, 60);
    }

    #[test]
    fn test_system_default_then_fallback() {
        let defaults = BookingDefaults {
            waitlist_capacity: Some(3),
            ..BookingDefaults::default()
        };

        let policy = resolve_policy(&template(), &defaults);
        assert_eq!(policy.waitlist_capacity, 3);
        assert_eq!(policy.capacity, FALLBACK_CAPACITY);
        assert_eq!(policy.booking_open_hours_before, FALLBACK_BOOKING_OPEN_HOURS);
        assert_eq!(policy.booking_close_minutes_before, FALLBACK_BOOKING_CLOSE_MINUTES);
        assert_eq!(policy.cancel_cutoff_minutes, FALLBACK_CANCEL_CUTOFF_MINUTES);
        assert_eq!(policy.credits_per_booking, FALLBACK_CREDITS_PER_BOOKING);
        assert!(policy.waitlist_enabled);
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let mut t = template();
        t.capacity = Some(-5);
        let policy = resolve_policy(&t, &BookingDefaults::default());
        assert_eq!(policy.capacity, 0);
    }

    #[test]
    fn test_booking_window_bounds() {
        let mut t = template();
        t.booking_open_hours_before = Some(24);
        t.booking_close_minutes_before = Some(30);
        let policy = resolve_policy(&t, &BookingDefaults::default());

        let start: DateTime<Utc> = "2026-03-10T18:00:00Z".parse().expect("timestamp");
        let window = policy.booking_window(start);
        assert!(!window.contains(start - Duration::hours(25)));
        assert!(window.contains(start - Duration::hours(24)));
        assert!(window.contains(start - Duration::minutes(31)));
        assert!(!window.contains(start - Duration::minutes(30)));
        assert!(!window.contains(start));
    }

    #[test]
    fn test_late_cancel_boundary() {
        let mut t = template();
        t.cancel_cutoff_minutes = Some(120);
        let policy = resolve_policy(&t, &BookingDefaults::default());

        let start: DateTime<Utc> = "2026-03-10T18:00:00Z".parse().expect("timestamp");
        assert!(!policy.is_late_cancel(start, start - Duration::minutes(121)));
        assert!(policy.is_late_cancel(start, start - Duration::minutes(120)));
        assert!(policy.is_late_cancel(start, start + Duration::minutes(5)));
    }
}
