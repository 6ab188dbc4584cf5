//! Booking state machine over one session's bookings.
//!
//! [`SessionBook`] holds everything a booking action may read or change for
//! a single session: the session, its template, the resolved policy, and all
//! booking rows. Actions mutate it in memory and post credit movements to a
//! [`CreditBook`]; the caller persists the changed rows and the ledger
//! entries in the same transaction that loaded them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use coachhub_core::error::{AppError, codes};
use coachhub_core::events::NotificationKind;
use coachhub_core::result::AppResult;
use coachhub_entity::class::{
    AttendanceOutcome, BookingSource, BookingStatus, ClassBooking, ClassSession, ClassTemplate,
    SessionStatus,
};

use super::occupancy::{Occupancy, effective_capacity, occupancy};
use super::policy::EffectivePolicy;
use crate::credit::CreditBook;

/// Options accepted by a book action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookOptions {
    /// Book even outside the booking window.
    pub ignore_booking_window: bool,
    /// Book a seat without debiting credits.
    pub skip_credit_debit: bool,
    /// Publish notifications after commit.
    pub notify: bool,
    /// Evaluation instant, defaults to now.
    pub at: Option<DateTime<Utc>>,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            ignore_booking_window: false,
            skip_credit_debit: false,
            notify: true,
            at: None,
        }
    }
}

/// Options accepted by cancel, promote, and attendance actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionOptions {
    /// Publish notifications after commit.
    pub notify: bool,
    /// Evaluation instant, defaults to now.
    pub at: Option<DateTime<Utc>>,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            notify: true,
            at: None,
        }
    }
}

/// A request to book a client into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    /// Target session.
    pub session_id: Uuid,
    /// Client being booked.
    pub client_id: Uuid,
    /// Who entered the booking.
    pub source: BookingSource,
    /// Acting user, if any.
    pub actor_id: Option<Uuid>,
    /// Behaviour switches.
    #[serde(default)]
    pub options: BookOptions,
}

/// How a book action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookResult {
    /// A seat was taken.
    Booked,
    /// The client joined the waitlist.
    Waitlisted,
    /// The client already held a seat or a waitlist spot.
    AlreadyExists,
}

/// Result of a book action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOutcome {
    /// The booking row after the action.
    pub booking: ClassBooking,
    /// What happened.
    pub result: BookResult,
    /// Queue position when waitlisted.
    pub waitlist_position: Option<i32>,
}

/// How a cancel action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelResult {
    /// The booking was cancelled now.
    Cancelled,
    /// The booking was cancelled before.
    AlreadyCancelled,
}

/// Result of a cancel action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOutcome {
    /// The booking row after the action.
    pub booking: ClassBooking,
    /// What happened.
    pub result: CancelResult,
    /// Whether the cancellation fell inside the no-refund window.
    pub late_cancel: bool,
    /// Waitlisted bookings that took the freed seat.
    pub promoted: Vec<ClassBooking>,
}

/// A notification to publish once the transaction has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Client to notify.
    pub recipient_id: Uuid,
    /// What happened to them.
    pub kind: NotificationKind,
    /// Queue position, for waitlist notices.
    pub waitlist_position: Option<i32>,
}

/// The locked booking aggregate of a single session.
#[derive(Debug, Clone)]
pub struct SessionBook {
    template: ClassTemplate,
    session: ClassSession,
    policy: EffectivePolicy,
    bookings: Vec<ClassBooking>,
    changed: HashSet<Uuid>,
    notices: Vec<Notice>,
}

impl SessionBook {
    /// Wrap a session, its template, its bookings, and the resolved policy.
    pub fn new(
        template: ClassTemplate,
        session: ClassSession,
        bookings: Vec<ClassBooking>,
        policy: EffectivePolicy,
    ) -> Self {
        Self {
            template,
            session,
            policy,
            bookings,
            changed: HashSet::new(),
            notices: Vec::new(),
        }
    }

    pub fn template(&self) -> &ClassTemplate {
        &self.template
    }

    pub fn session(&self) -> &ClassSession {
        &self.session
    }

    pub fn policy(&self) -> &EffectivePolicy {
        &self.policy
    }

    pub fn bookings(&self) -> &[ClassBooking] {
        &self.bookings
    }

    /// Find a booking of this session by id.
    pub fn booking(&self, booking_id: Uuid) -> Option<&ClassBooking> {
        self.bookings.iter().find(|b| b.id == booking_id)
    }

    /// Current seat and waitlist usage.
    pub fn occupancy(&self) -> Occupancy {
        occupancy(&self.bookings)
    }

    /// Seat capacity after the session override.
    pub fn capacity(&self) -> i32 {
        effective_capacity(&self.session, &self.policy)
    }

    /// Waitlisted clients in queue order.
    pub fn waitlist(&self) -> Vec<&ClassBooking> {
        let mut queue: Vec<&ClassBooking> = self
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Waitlisted)
            .collect();
        queue.sort_by_key(|b| (b.waitlist_position.unwrap_or(i32::MAX), b.created_at));
        queue
    }

    /// Rows changed by actions so far, in load order.
    pub fn changed_bookings(&self) -> Vec<&ClassBooking> {
        self.bookings
            .iter()
            .filter(|b| self.changed.contains(&b.id))
            .collect()
    }

    /// Drain the notices produced so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn ensure_scheduled(&self) -> AppResult<()> {
        if self.session.is_scheduled() {
            Ok(())
        } else {
            Err(AppError::session_not_scheduled())
        }
    }

    fn index_of(&self, booking_id: Uuid) -> AppResult<usize> {
        self.bookings
            .iter()
            .position(|b| b.id == booking_id)
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))
    }

    fn notice(&mut self, recipient_id: Uuid, kind: NotificationKind, position: Option<i32>) {
        self.notices.push(Notice {
            recipient_id,
            kind,
            waitlist_position: position,
        });
    }

    /// Book a client into the session, or onto its waitlist.
    ///
    /// Fails without touching the aggregate or the credit book.
    pub fn book(
        &mut self,
        credits: &mut CreditBook,
        request: &BookRequest,
        now: DateTime<Utc>,
    ) -> AppResult<BookOutcome> {
        self.ensure_scheduled()?;

        let window = self.policy.booking_window(self.session.starts_at);
        if !request.options.ignore_booking_window && !window.contains(now) {
            return Err(AppError::booking_window_closed());
        }

        let existing = self
            .bookings
            .iter()
            .position(|b| b.client_id == request.client_id);
        if let Some(idx) = existing {
            let booking = &self.bookings[idx];
            if booking.status.is_active() {
                return Ok(BookOutcome {
                    booking: booking.clone(),
                    result: BookResult::AlreadyExists,
                    waitlist_position: booking.waitlist_position,
                });
            }
            if booking.status.is_terminal() {
                return Err(AppError::attendance_already_marked());
            }
        }

        let occupancy = self.occupancy();
        let (status, position) = if occupancy.booked < self.capacity() {
            (BookingStatus::Booked, None)
        } else if occupancy.waitlist_has_room(&self.policy) {
            (BookingStatus::Waitlisted, Some(occupancy.waitlisted + 1))
        } else {
            return Err(AppError::class_full());
        };

        let booking_id = existing.map_or_else(Uuid::new_v4, |idx| self.bookings[idx].id);
        if status == BookingStatus::Booked && !request.options.skip_credit_debit {
            credits.debit_booking(
                request.client_id,
                booking_id,
                i64::from(self.policy.credits_per_booking),
            )?;
        }

        let idx = match existing {
            Some(idx) => {
                let booking = &mut self.bookings[idx];
                booking.status = status;
                booking.source = request.source;
                booking.booked_by = request.actor_id;
                booking.updated_at = now;
                idx
            }
            None => {
                let mut booking = ClassBooking::new(
                    self.session.id,
                    request.client_id,
                    status,
                    request.source,
                    request.actor_id,
                    now,
                );
                booking.id = booking_id;
                self.bookings.push(booking);
                self.bookings.len() - 1
            }
        };
        self.bookings[idx].waitlist_position = position;
        self.changed.insert(booking_id);

        let (result, kind) = match status {
            BookingStatus::Booked => (BookResult::Booked, NotificationKind::Booked),
            _ => (BookResult::Waitlisted, NotificationKind::Waitlisted),
        };
        self.notice(request.client_id, kind, position);

        Ok(BookOutcome {
            booking: self.bookings[idx].clone(),
            result,
            waitlist_position: position,
        })
    }

    /// Cancel a booking, refund it when on time, and refill the freed seat
    /// from the waitlist.
    pub fn cancel(
        &mut self,
        credits: &mut CreditBook,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<CancelOutcome> {
        let idx = self.index_of(booking_id)?;
        let status = self.bookings[idx].status;

        if status.is_cancelled() {
            return Ok(CancelOutcome {
                booking: self.bookings[idx].clone(),
                result: CancelResult::AlreadyCancelled,
                late_cancel: status == BookingStatus::LateCancel,
                promoted: Vec::new(),
            });
        }
        if status.is_terminal() {
            return Err(AppError::invalid_state(
                codes::INVALID_BOOKING_STATE,
                format!("A booking marked {status} cannot be cancelled"),
            ));
        }
        self.ensure_scheduled()?;

        let client_id = self.bookings[idx].client_id;
        let late_cancel = status == BookingStatus::Booked
            && self.policy.is_late_cancel(self.session.starts_at, now);
        let new_status = if late_cancel {
            BookingStatus::LateCancel
        } else {
            if status == BookingStatus::Booked {
                let refunded = credits.refund_booking(client_id, booking_id);
                debug!(%booking_id, %client_id, refunded, "Booking refunded");
            }
            BookingStatus::Cancelled
        };

        let booking = &mut self.bookings[idx];
        booking.status = new_status;
        booking.waitlist_position = None;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;
        self.changed.insert(booking_id);
        self.notice(client_id, NotificationKind::Cancelled, None);

        self.normalize_waitlist(now);
        let promoted = self.fill_open_seats(credits, now);

        Ok(CancelOutcome {
            booking: self.bookings[idx].clone(),
            result: CancelResult::Cancelled,
            late_cancel,
            promoted,
        })
    }

    /// Move waitlisted clients into open seats.
    pub fn promote_waitlist(
        &mut self,
        credits: &mut CreditBook,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ClassBooking>> {
        self.ensure_scheduled()?;
        Ok(self.fill_open_seats(credits, now))
    }

    /// Walk the queue in order, debiting and seating every client who can
    /// pay until the seats run out. Clients who cannot pay keep their spot.
    fn fill_open_seats(&mut self, credits: &mut CreditBook, now: DateTime<Utc>) -> Vec<ClassBooking> {
        if !self.session.is_scheduled() || self.session.starts_at <= now {
            return Vec::new();
        }

        let mut open_seats = self.occupancy().open_seats(self.capacity());
        let queue: Vec<Uuid> = self.waitlist().iter().map(|b| b.id).collect();
        let cost = i64::from(self.policy.credits_per_booking);
        let mut promoted = Vec::new();

        for booking_id in queue {
            if open_seats == 0 {
                break;
            }
            let Some(idx) = self.bookings.iter().position(|b| b.id == booking_id) else {
                continue;
            };
            let client_id = self.bookings[idx].client_id;

            if let Err(err) = credits.debit_booking(client_id, booking_id, cost) {
                debug!(%booking_id, %client_id, error = %err, "Skipping waitlisted client");
                continue;
            }

            let booking = &mut self.bookings[idx];
            booking.status = BookingStatus::Booked;
            booking.waitlist_position = None;
            booking.updated_at = now;
            promoted.push(booking.clone());
            self.changed.insert(booking_id);
            self.notice(client_id, NotificationKind::WaitlistPromoted, None);
            open_seats -= 1;
        }

        self.normalize_waitlist(now);
        promoted
    }

    /// Renumber the waitlist to 1..N in queue order.
    pub fn normalize_waitlist(&mut self, now: DateTime<Utc>) {
        let queue: Vec<Uuid> = self.waitlist().iter().map(|b| b.id).collect();
        for (position, booking_id) in (1..).zip(queue) {
            if let Some(booking) = self.bookings.iter_mut().find(|b| b.id == booking_id)
                && booking.waitlist_position != Some(position)
            {
                booking.waitlist_position = Some(position);
                booking.updated_at = now;
                self.changed.insert(booking_id);
            }
        }
    }

    /// Record whether a booked client attended.
    pub fn mark_attendance(
        &mut self,
        booking_id: Uuid,
        outcome: AttendanceOutcome,
        now: DateTime<Utc>,
    ) -> AppResult<ClassBooking> {
        let idx = self.index_of(booking_id)?;
        let status = self.bookings[idx].status;

        if status.is_terminal() {
            return Err(AppError::attendance_already_marked());
        }
        if status != BookingStatus::Booked {
            return Err(AppError::invalid_state(
                codes::INVALID_BOOKING_STATE,
                format!("Attendance cannot be marked for a {status} booking"),
            ));
        }
        if self.session.status == SessionStatus::Cancelled {
            return Err(AppError::session_not_scheduled());
        }

        let booking = &mut self.bookings[idx];
        booking.status = outcome.into();
        booking.attendance_marked_at = Some(now);
        booking.updated_at = now;
        self.changed.insert(booking_id);

        Ok(self.bookings[idx].clone())
    }
}
