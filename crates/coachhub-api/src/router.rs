//! Route definitions for the CoachHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and request tracing.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(booking_routes())
        .merge(credit_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Booking lifecycle endpoints
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions/{id}/bookings",
            post(handlers::booking::book_session),
        )
        .route(
            "/sessions/{id}/waitlist/promote",
            post(handlers::booking::promote_waitlist),
        )
        .route("/bookings/{id}/cancel", post(handlers::booking::cancel_booking))
        .route(
            "/bookings/{id}/attendance",
            post(handlers::booking::mark_attendance),
        )
}

/// Credit balance, adjustments, and purchase submissions
fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/clients/{id}/credits", get(handlers::credit::credit_summary))
        .route(
            "/clients/{id}/credits/adjustments",
            post(handlers::credit::admin_adjust),
        )
        .route("/credit-submissions", post(handlers::credit::submit_purchase))
        .route(
            "/credit-submissions/{id}/review",
            post(handlers::credit::review_submission),
        )
}

/// Operator endpoints
fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/credits/monthly-run",
        post(handlers::credit::run_monthly_topup),
    )
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
