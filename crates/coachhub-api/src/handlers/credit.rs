//! Credit balance, adjustment, purchase, and monthly run handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use coachhub_core::error::AppError;
use coachhub_entity::credit::CreditSubmission;
use coachhub_service::credit::{CreditSummary, LedgerPosting, ReviewOutcome, TopupRunReport};

use crate::dto::request::{
    AdminAdjustRequest, CreditSummaryQuery, MonthlyRunRequest, ReviewSubmissionRequest,
    SubmitPurchaseRequest,
};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// GET /api/clients/{id}/credits
pub async fn credit_summary(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Query(query): Query<CreditSummaryQuery>,
) -> ApiResult<Json<ApiResponse<CreditSummary>>> {
    let summary = state
        .ledger_service
        .credit_summary(client_id, query.at)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/clients/{id}/credits/adjustments
pub async fn admin_adjust(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<AdminAdjustRequest>,
) -> ApiResult<Json<ApiResponse<LedgerPosting>>> {
    validate(&req)?;
    let posting = state
        .ledger_service
        .admin_adjust(client_id, req.delta, req.actor_id, req.note, req.at)
        .await?;
    Ok(Json(ApiResponse::ok(posting)))
}

/// POST /api/credit-submissions
pub async fn submit_purchase(
    State(state): State<AppState>,
    Json(req): Json<SubmitPurchaseRequest>,
) -> ApiResult<Json<ApiResponse<CreditSubmission>>> {
    validate(&req)?;
    let submission = state
        .review_service
        .submit_credit_purchase(
            req.client_id,
            req.product_id,
            &req.payment_reference,
            req.note.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(submission)))
}

/// POST /api/credit-submissions/{id}/review
pub async fn review_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<ReviewSubmissionRequest>,
) -> ApiResult<Json<ApiResponse<ReviewOutcome>>> {
    let outcome = state
        .review_service
        .review_credit_submission(submission_id, req.action, req.reviewer_id, req.at)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/admin/credits/monthly-run
pub async fn run_monthly_topup(
    State(state): State<AppState>,
    Json(req): Json<MonthlyRunRequest>,
) -> ApiResult<Json<ApiResponse<TopupRunReport>>> {
    let report = state
        .topup_service
        .run_monthly_credit_topup_and_expiry(req.run_at, req.actor_id)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}
