//! Seat and waitlist occupancy of a session.

use serde::{Deserialize, Serialize};

use coachhub_entity::class::{BookingStatus, ClassBooking, ClassSession};

use super::policy::EffectivePolicy;

/// Derived seat usage of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Bookings holding a seat (`BOOKED`, `ATTENDED`, `NO_SHOW`).
    pub booked: i32,
    /// Bookings in the queue.
    pub waitlisted: i32,
}

/// Count seat and waitlist usage across a session's bookings.
pub fn occupancy(bookings: &[ClassBooking]) -> Occupancy {
    bookings.iter().fold(Occupancy::default(), |mut acc, b| {
        if b.status.consumes_seat() {
            acc.booked += 1;
        } else if b.status == BookingStatus::Waitlisted {
            acc.waitlisted += 1;
        }
        acc
    })
}

impl Occupancy {
    /// Seats still free under `capacity`.
    pub fn open_seats(&self, capacity: i32) -> i32 {
        (capacity - self.booked).max(0)
    }

    /// Whether the waitlist can take one more client.
    pub fn waitlist_has_room(&self, policy: &EffectivePolicy) -> bool {
        policy.waitlist_available() && self.waitlisted < policy.waitlist_capacity
    }
}

/// Seat capacity of a session: its override if set, else the policy's.
pub fn effective_capacity(session: &ClassSession, policy: &EffectivePolicy) -> i32 {
    session.capacity_override.unwrap_or(policy.capacity).max(0)
}
