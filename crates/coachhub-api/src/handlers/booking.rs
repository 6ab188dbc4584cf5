//! Booking lifecycle handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use coachhub_entity::class::ClassBooking;
use coachhub_service::booking::{
    ActionOptions, BookOptions, BookOutcome, BookRequest, CancelOutcome,
};

use crate::dto::request::{BookSessionRequest, BookingActionRequest, MarkAttendanceRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/sessions/{id}/bookings
pub async fn book_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<BookSessionRequest>,
) -> ApiResult<Json<ApiResponse<BookOutcome>>> {
    let outcome = state
        .booking_service
        .book_client_into_session(BookRequest {
            session_id,
            client_id: req.client_id,
            source: req.source,
            actor_id: req.actor_id,
            options: BookOptions {
                ignore_booking_window: req.ignore_booking_window,
                skip_credit_debit: req.skip_credit_debit,
                notify: req.notify,
                at: req.at,
            },
        })
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<BookingActionRequest>,
) -> ApiResult<Json<ApiResponse<CancelOutcome>>> {
    let outcome = state
        .booking_service
        .cancel_booking(booking_id, req.actor_id, action_options(&req))
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/sessions/{id}/waitlist/promote
pub async fn promote_waitlist(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<BookingActionRequest>,
) -> ApiResult<Json<ApiResponse<Vec<ClassBooking>>>> {
    let promoted = state
        .booking_service
        .promote_waitlist_for_session(session_id, req.actor_id, action_options(&req))
        .await?;

    Ok(Json(ApiResponse::ok(promoted)))
}

/// POST /api/bookings/{id}/attendance
pub async fn mark_attendance(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<MarkAttendanceRequest>,
) -> ApiResult<Json<ApiResponse<ClassBooking>>> {
    let booking = state
        .booking_service
        .mark_attendance(
            booking_id,
            req.outcome,
            req.actor_id,
            ActionOptions {
                notify: false,
                at: req.at,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(booking)))
}

fn action_options(req: &BookingActionRequest) -> ActionOptions {
    ActionOptions {
        notify: req.notify,
        at: req.at,
    }
}
