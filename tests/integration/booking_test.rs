//! Integration tests for the transactional booking service.

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use coachhub_core::error::codes;
use coachhub_core::events::NotificationKind;
use coachhub_database::repositories::{ClassRepository, LedgerRepository};
use coachhub_entity::class::{AttendanceOutcome, BookingSource, BookingStatus, SessionStatus};
use coachhub_entity::credit::LedgerReason;
use coachhub_service::booking::{
    ActionOptions, BookOptions, BookRequest, BookResult, CancelResult,
};

fn request(session_id: Uuid, client_id: Uuid) -> BookRequest {
    BookRequest {
        session_id,
        client_id,
        source: BookingSource::Client,
        actor_id: Some(client_id),
        options: BookOptions::default(),
    }
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_book_debits_one_credit() {
    let mut app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 1).await;
    let client = app.client_with_credits(3).await;

    let outcome = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("booking should succeed");

    assert_eq!(outcome.result, BookResult::Booked);
    assert_eq!(outcome.booking.status, BookingStatus::Booked);
    assert_eq!(app.available(client).await, 2);

    let entries = LedgerRepository::new(app.db_pool.clone())
        .find_by_booking(outcome.booking.id)
        .await
        .expect("ledger rows");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reason, LedgerReason::BookingDebit);
    assert_eq!(entries[0].delta, -1);

    let kinds: Vec<_> = app.drain_notifications().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Booked]);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_full_class_waitlists_then_rejects() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(1, 1).await;
    let first = app.client_with_credits(1).await;
    let second = app.client_with_credits(1).await;
    let third = app.client_with_credits(1).await;

    app.booking
        .book_client_into_session(request(session.id, first))
        .await
        .expect("first seat");

    let waitlisted = app
        .booking
        .book_client_into_session(request(session.id, second))
        .await
        .expect("waitlist");
    assert_eq!(waitlisted.result, BookResult::Waitlisted);
    assert_eq!(waitlisted.waitlist_position, Some(1));
    assert_eq!(app.available(second).await, 1, "waitlist does not debit");

    let err = app
        .booking
        .book_client_into_session(request(session.id, third))
        .await
        .expect_err("class and waitlist are full");
    assert!(err.is(codes::CLASS_FULL));
    assert_eq!(app.available(third).await, 1);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_rebooking_returns_existing_booking() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    let client = app.client_with_credits(2).await;

    let first = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("booked");
    let second = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("idempotent");

    assert_eq!(second.result, BookResult::AlreadyExists);
    assert_eq!(second.booking.id, first.booking.id);
    assert_eq!(app.available(client).await, 1, "only one debit");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_insufficient_credits_leaves_no_booking() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    let client = app.client_with_credits(0).await;

    let err = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect_err("no credits");
    assert!(err.is(codes::INSUFFICIENT_CREDITS));

    let bookings = coachhub_database::repositories::BookingRepository::new(app.db_pool.clone())
        .find_by_session(session.id)
        .await
        .expect("bookings");
    assert!(bookings.is_empty());
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_cancel_refunds_and_promotes_waitlist() {
    let mut app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(1, 2).await;
    let seated = app.client_with_credits(1).await;
    let waiting = app.client_with_credits(1).await;

    let seat = app
        .booking
        .book_client_into_session(request(session.id, seated))
        .await
        .expect("seat");
    app.booking
        .book_client_into_session(request(session.id, waiting))
        .await
        .expect("waitlist");
    app.drain_notifications();

    let outcome = app
        .booking
        .cancel_booking(seat.booking.id, Some(seated), ActionOptions::default())
        .await
        .expect("cancel");

    assert_eq!(outcome.result, CancelResult::Cancelled);
    assert!(!outcome.late_cancel);
    assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
    assert_eq!(outcome.promoted.len(), 1);
    assert_eq!(outcome.promoted[0].client_id, waiting);
    assert_eq!(outcome.promoted[0].status, BookingStatus::Booked);

    assert_eq!(app.available(seated).await, 1, "refunded");
    assert_eq!(app.available(waiting).await, 0, "promoted client paid");

    let kinds: Vec<_> = app.drain_notifications().iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NotificationKind::Cancelled, NotificationKind::WaitlistPromoted]
    );
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_late_cancel_keeps_credit_and_refund_happens_once() {
    let app = helpers::TestApp::new().await;
    let template = app.create_template(2, 0, 720).await;
    let session = app
        .create_session(&template, Utc::now() + Duration::hours(3))
        .await;
    let client = app.client_with_credits(1).await;

    let seat = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("seat");

    let outcome = app
        .booking
        .cancel_booking(seat.booking.id, Some(client), ActionOptions::default())
        .await
        .expect("late cancel");
    assert!(outcome.late_cancel);
    assert_eq!(outcome.booking.status, BookingStatus::LateCancel);
    assert_eq!(app.available(client).await, 0);

    let again = app
        .booking
        .cancel_booking(seat.booking.id, Some(client), ActionOptions::default())
        .await
        .expect("second cancel is a no-op");
    assert_eq!(again.result, CancelResult::AlreadyCancelled);
    assert_eq!(app.available(client).await, 0);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_rebook_after_cancel_reuses_row() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    let client = app.client_with_credits(1).await;

    let first = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("seat");
    app.booking
        .cancel_booking(first.booking.id, Some(client), ActionOptions::default())
        .await
        .expect("cancel");
    let again = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("rebook");

    assert_eq!(again.result, BookResult::Booked);
    assert_eq!(again.booking.id, first.booking.id);
    assert_eq!(app.available(client).await, 0);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_cancelled_session_rejects_booking() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    ClassRepository::new(app.db_pool.clone())
        .set_session_status(session.id, SessionStatus::Cancelled)
        .await
        .expect("status");
    let client = app.client_with_credits(1).await;

    let err = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect_err("session cancelled");
    assert!(err.is(codes::SESSION_NOT_SCHEDULED));
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_booking_window_bypass_for_coach() {
    let app = helpers::TestApp::new().await;
    let template = app.create_template(2, 0, 720).await;
    let session = app
        .create_session(&template, Utc::now() + Duration::days(30))
        .await;
    let client = app.client_with_credits(1).await;

    let err = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect_err("window not yet open");
    assert!(err.is(codes::BOOKING_WINDOW_CLOSED));

    let mut coach_request = request(session.id, client);
    coach_request.source = BookingSource::Coach;
    coach_request.actor_id = Some(template.coach_id);
    coach_request.options.ignore_booking_window = true;
    let outcome = app
        .booking
        .book_client_into_session(coach_request)
        .await
        .expect("coach bypass");
    assert_eq!(outcome.result, BookResult::Booked);
    assert_eq!(outcome.booking.source, BookingSource::Coach);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_attendance_is_terminal() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    let client = app.client_with_credits(1).await;

    let seat = app
        .booking
        .book_client_into_session(request(session.id, client))
        .await
        .expect("seat");

    let marked = app
        .booking
        .mark_attendance(
            seat.booking.id,
            AttendanceOutcome::NoShow,
            None,
            ActionOptions::default(),
        )
        .await
        .expect("mark");
    assert_eq!(marked.status, BookingStatus::NoShow);
    assert!(marked.attendance_marked_at.is_some());

    let err = app
        .booking
        .mark_attendance(
            seat.booking.id,
            AttendanceOutcome::Attended,
            None,
            ActionOptions::default(),
        )
        .await
        .expect_err("already marked");
    assert!(err.is(codes::ATTENDANCE_ALREADY_MARKED));
    assert_eq!(app.available(client).await, 0, "no refund for no-show");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_concurrent_bookings_never_oversell() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(3, 0).await;

    let mut clients = Vec::new();
    for _ in 0..8 {
        clients.push(app.client_with_credits(1).await);
    }

    let session_id = session.id;
    let mut handles = Vec::new();
    for client in clients {
        let booking = std::sync::Arc::clone(&app.booking);
        handles.push(tokio::spawn(async move {
            booking
                .book_client_into_session(request(session_id, client))
                .await
        }));
    }

    let mut booked = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(outcome) => {
                assert_eq!(outcome.result, BookResult::Booked);
                booked += 1;
            }
            Err(e) => {
                assert!(e.is(codes::CLASS_FULL), "unexpected error: {e}");
                full += 1;
            }
        }
    }
    assert_eq!(booked, 3);
    assert_eq!(full, 5);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_notify_false_publishes_nothing() {
    let mut app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;
    let client = app.client_with_credits(1).await;

    let mut quiet = request(session.id, client);
    quiet.options.notify = false;
    app.booking
        .book_client_into_session(quiet)
        .await
        .expect("seat");

    assert!(app.drain_notifications().is_empty());
}
