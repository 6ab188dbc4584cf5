//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use coachhub_core::config::AppConfig;
use coachhub_service::booking::BookingService;
use coachhub_service::credit::{CreditLedgerService, MonthlyTopupService, ReviewService};

/// Shared state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Database pool, for health checks.
    pub db: PgPool,
    /// Booking engine.
    pub booking_service: Arc<BookingService>,
    /// Ledger reads and manual adjustments.
    pub ledger_service: Arc<CreditLedgerService>,
    /// Purchase submission and review.
    pub review_service: Arc<ReviewService>,
    /// Monthly top-up and expiry run.
    pub topup_service: Arc<MonthlyTopupService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
