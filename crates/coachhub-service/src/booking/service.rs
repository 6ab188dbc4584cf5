//! Transactional booking service.
//!
//! Every action locks the session row, shares its template row, loads the
//! session's bookings, locks the affected credit accounts in ascending
//! client order, runs the state machine, and writes everything back before
//! a single commit. Notifications go out only after the commit succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use coachhub_core::config::BookingDefaults;
use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::events::BookingNotification;
use coachhub_core::result::AppResult;
use coachhub_core::traits::{BookingNotifier, SettingsProvider};
use coachhub_database::repositories::{BookingRepository, ClassRepository, LedgerRepository};
use coachhub_entity::class::{AttendanceOutcome, BookingStatus, ClassBooking};

use super::engine::{
    ActionOptions, BookOutcome, BookRequest, CancelOutcome, Notice, SessionBook,
};
use super::policy::resolve_policy;
use crate::credit::CreditBook;

/// Books, cancels, promotes, and marks attendance under row locks.
pub struct BookingService {
    pool: PgPool,
    classes: ClassRepository,
    bookings: BookingRepository,
    ledger: LedgerRepository,
    settings: Arc<dyn SettingsProvider>,
    notifier: Arc<dyn BookingNotifier>,
}

impl std::fmt::Debug for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingService").finish_non_exhaustive()
    }
}

impl BookingService {
    /// Create a new booking service.
    pub fn new(
        pool: PgPool,
        settings: Arc<dyn SettingsProvider>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        Self {
            classes: ClassRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            pool,
            settings,
            notifier,
        }
    }

    /// Book a client into a session, or onto its waitlist.
    #[instrument(skip(self, request), fields(session_id = %request.session_id, client_id = %request.client_id))]
    pub async fn book_client_into_session(&self, request: BookRequest) -> AppResult<BookOutcome> {
        let defaults = self.settings.booking_defaults().await?;
        let now = request.options.at.unwrap_or_else(Utc::now);

        let mut tx = self.begin().await?;
        let mut book = self
            .load_session_book(&mut *tx, request.session_id, &defaults)
            .await?;
        let mut credits = self
            .load_credits(&mut *tx, &[request.client_id], &[], request.actor_id, now)
            .await?;

        let outcome = book.book(&mut credits, &request, now)?;
        self.persist(&mut *tx, &book, credits, now).await?;
        commit(tx).await?;

        info!(
            booking_id = %outcome.booking.id,
            result = ?outcome.result,
            waitlist_position = ?outcome.waitlist_position,
            "Booking processed"
        );

        if request.options.notify {
            self.dispatch(&mut book, request.actor_id, &defaults);
        }
        Ok(outcome)
    }

    /// Cancel a booking, refunding it when on time, then promote the waitlist.
    #[instrument(skip(self, options), fields(booking_id = %booking_id))]
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        actor_id: Option<Uuid>,
        options: ActionOptions,
    ) -> AppResult<CancelOutcome> {
        let session_id = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .map(|b| b.session_id)
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;
        let defaults = self.settings.booking_defaults().await?;
        let now = options.at.unwrap_or_else(Utc::now);

        let mut tx = self.begin().await?;
        let mut book = self.load_session_book(&mut *tx, session_id, &defaults).await?;
        let booking = book
            .booking(booking_id)
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;

        let mut clients = waitlisted_clients(&book);
        clients.push(booking.client_id);
        let mut credits = self
            .load_credits(&mut *tx, &clients, &[booking_id], actor_id, now)
            .await?;

        let outcome = book.cancel(&mut credits, booking_id, now)?;
        self.persist(&mut *tx, &book, credits, now).await?;
        commit(tx).await?;

        info!(
            %session_id,
            result = ?outcome.result,
            late_cancel = outcome.late_cancel,
            promoted = outcome.promoted.len(),
            "Booking cancelled"
        );

        if options.notify {
            self.dispatch(&mut book, actor_id, &defaults);
        }
        Ok(outcome)
    }

    /// Fill open seats of a session from its waitlist.
    #[instrument(skip(self, options), fields(session_id = %session_id))]
    pub async fn promote_waitlist_for_session(
        &self,
        session_id: Uuid,
        actor_id: Option<Uuid>,
        options: ActionOptions,
    ) -> AppResult<Vec<ClassBooking>> {
        let defaults = self.settings.booking_defaults().await?;
        let now = options.at.unwrap_or_else(Utc::now);

        let mut tx = self.begin().await?;
        let mut book = self.load_session_book(&mut *tx, session_id, &defaults).await?;
        let clients = waitlisted_clients(&book);
        let mut credits = self
            .load_credits(&mut *tx, &clients, &[], actor_id, now)
            .await?;

        let promoted = book.promote_waitlist(&mut credits, now)?;
        self.persist(&mut *tx, &book, credits, now).await?;
        commit(tx).await?;

        info!(promoted = promoted.len(), "Waitlist promotion finished");

        if options.notify {
            self.dispatch(&mut book, actor_id, &defaults);
        }
        Ok(promoted)
    }

    /// Record attendance for a booked client.
    #[instrument(skip(self, options), fields(booking_id = %booking_id))]
    pub async fn mark_attendance(
        &self,
        booking_id: Uuid,
        outcome: AttendanceOutcome,
        actor_id: Option<Uuid>,
        options: ActionOptions,
    ) -> AppResult<ClassBooking> {
        let session_id = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .map(|b| b.session_id)
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;
        let defaults = self.settings.booking_defaults().await?;
        let now = options.at.unwrap_or_else(Utc::now);

        let mut tx = self.begin().await?;
        let mut book = self.load_session_book(&mut *tx, session_id, &defaults).await?;
        let booking = book.mark_attendance(booking_id, outcome, now)?;
        self.persist(&mut *tx, &book, CreditBook::default(), now).await?;
        commit(tx).await?;

        info!(
            %session_id,
            status = %booking.status,
            actor_id = ?actor_id,
            "Attendance marked"
        );
        Ok(booking)
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    /// Lock the session, share its template, and load its bookings.
    async fn load_session_book(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
        defaults: &BookingDefaults,
    ) -> AppResult<SessionBook> {
        let session = self
            .classes
            .lock_session(&mut *conn, session_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;
        let template = self
            .classes
            .share_template(&mut *conn, session.template_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Class template {} not found", session.template_id))
            })?;
        let bookings = self.bookings.load_for_session(conn, session_id).await?;
        let policy = resolve_policy(&template, defaults);

        Ok(SessionBook::new(template, session, bookings, policy))
    }

    /// Lock the clients' accounts and read their credit positions.
    async fn load_credits(
        &self,
        conn: &mut PgConnection,
        clients: &[Uuid],
        booking_ids: &[Uuid],
        actor_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> AppResult<CreditBook> {
        self.ledger.lock_accounts(&mut *conn, clients).await?;
        let available = self.ledger.available_for(&mut *conn, clients, at).await?;
        let booking_net = if booking_ids.is_empty() {
            HashMap::new()
        } else {
            self.ledger.booking_net(conn, booking_ids).await?
        };
        Ok(CreditBook::new(available, booking_net, actor_id))
    }

    /// Write changed bookings, then ledger rows, then recomputed balances.
    async fn persist(
        &self,
        conn: &mut PgConnection,
        book: &SessionBook,
        credits: CreditBook,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        for booking in book.changed_bookings() {
            self.bookings.upsert(&mut *conn, booking).await?;
        }

        let touched = credits.touched_clients();
        for entry in credits.into_entries() {
            self.ledger.insert(&mut *conn, &entry, at).await?;
        }
        for client_id in touched {
            self.ledger.refresh_balance(&mut *conn, client_id, at).await?;
        }
        Ok(())
    }

    fn dispatch(&self, book: &mut SessionBook, actor_id: Option<Uuid>, defaults: &BookingDefaults) {
        let notices = book.take_notices();
        for notice in notices {
            self.notifier
                .notify(notification_for(book, notice, actor_id, &defaults.timezone));
        }
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit().await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to commit booking transaction", e)
    })
}

fn waitlisted_clients(book: &SessionBook) -> Vec<Uuid> {
    book.bookings()
        .iter()
        .filter(|b| b.status == BookingStatus::Waitlisted)
        .map(|b| b.client_id)
        .collect()
}

fn notification_for(
    book: &SessionBook,
    notice: Notice,
    actor_id: Option<Uuid>,
    timezone: &str,
) -> BookingNotification {
    BookingNotification {
        actor_id,
        recipient_id: notice.recipient_id,
        kind: notice.kind,
        class_name: book.template().name.clone(),
        starts_at: book.session().starts_at,
        location_label: book.template().location_display(),
        timezone: timezone.to_string(),
        waitlist_position: notice.waitlist_position,
    }
}
