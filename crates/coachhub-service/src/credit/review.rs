//! Credit purchase submissions and their review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind, codes};
use coachhub_core::result::AppResult;
use coachhub_database::repositories::{
    ProductRepository, SubmissionRepository, SubscriptionRepository,
};
use coachhub_entity::credit::{
    CreditProduct, CreditSubmission, LedgerReason, NewLedgerEntry, ProductMode, ReviewAction,
    SubmissionStatus,
};

use super::ledger::CreditLedgerService;
use super::topup::apply_monthly_topup;

/// What approving a purchase of a product grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApprovalGrant {
    /// A single non-expiring `PACK_PURCHASE` entry.
    Pack { credits: i64 },
    /// An active subscription, topped up for the current month if owed.
    Subscription { monthly_credits: i32 },
    /// No credits change hands.
    Nothing,
}

/// Decide the grant for approving a purchase of `product`.
pub fn plan_approval(product: &CreditProduct) -> ApprovalGrant {
    match product.mode {
        ProductMode::OneTimePack if product.credits > 0 => ApprovalGrant::Pack {
            credits: i64::from(product.credits),
        },
        ProductMode::MonthlyTopup => ApprovalGrant::Subscription {
            monthly_credits: product.credits,
        },
        ProductMode::OneTimePack | ProductMode::CatalogOnly => ApprovalGrant::Nothing,
    }
}

/// Result of reviewing a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The resolved submission.
    pub submission: CreditSubmission,
    /// Credits granted by the review.
    pub credits_applied: i64,
}

/// Records purchase claims and resolves them exactly once.
#[derive(Debug, Clone)]
pub struct ReviewService {
    pool: PgPool,
    submissions: SubmissionRepository,
    products: ProductRepository,
    subscriptions: SubscriptionRepository,
    credits: CreditLedgerService,
}

impl ReviewService {
    /// Create a new review service.
    pub fn new(pool: PgPool) -> Self {
        Self {
            submissions: SubmissionRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            credits: CreditLedgerService::new(pool.clone()),
            pool,
        }
    }

    /// Record a client's claim to have paid for a product.
    pub async fn submit_credit_purchase(
        &self,
        client_id: Uuid,
        product_id: Uuid,
        payment_reference: &str,
        note: Option<&str>,
    ) -> AppResult<CreditSubmission> {
        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            return Err(AppError::validation("Payment reference must not be empty"));
        }

        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Credit product {product_id} not found")))?;
        if !product.is_active {
            return Err(AppError::invalid_state(
                codes::PRODUCT_INACTIVE,
                format!("Credit product '{}' is no longer offered", product.name),
            ));
        }
        if product.provider_only_purchase {
            return Err(AppError::invalid_state(
                codes::PROVIDER_ONLY_PRODUCT,
                format!("Credit product '{}' can only be sold by the provider", product.name),
            ));
        }

        let submission = self
            .submissions
            .create(client_id, product_id, payment_reference, note)
            .await?;
        info!(
            submission_id = %submission.id,
            %client_id,
            %product_id,
            "Credit purchase submitted"
        );
        Ok(submission)
    }

    /// Approve or reject a pending submission.
    pub async fn review_credit_submission(
        &self,
        submission_id: Uuid,
        action: ReviewAction,
        reviewer_id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<ReviewOutcome> {
        let at = at.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let submission = self
            .submissions
            .lock(&mut *tx, submission_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Credit submission {submission_id} not found"))
            })?;
        if submission.status.is_resolved() {
            return Err(AppError::already_reviewed());
        }

        let credits_applied = match action {
            ReviewAction::Reject => 0,
            ReviewAction::Approve => {
                let product = self
                    .products
                    .load(&mut *tx, submission.product_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "Credit product {} not found",
                            submission.product_id
                        ))
                    })?;
                self.apply_grant(&mut *tx, &submission, &product, reviewer_id, at)
                    .await?
            }
        };

        let status = SubmissionStatus::from(action);
        let submission = self
            .submissions
            .resolve(&mut *tx, submission_id, status, reviewer_id, credits_applied, at)
            .await?
            .ok_or_else(AppError::already_reviewed)?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit review", e)
        })?;

        info!(
            %submission_id,
            status = %submission.status,
            credits_applied,
            %reviewer_id,
            "Credit submission reviewed"
        );
        Ok(ReviewOutcome {
            submission,
            credits_applied,
        })
    }

    async fn apply_grant(
        &self,
        conn: &mut PgConnection,
        submission: &CreditSubmission,
        product: &CreditProduct,
        reviewer_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        match plan_approval(product) {
            ApprovalGrant::Pack { credits } => {
                let entry = NewLedgerEntry::new(
                    submission.client_id,
                    credits,
                    LedgerReason::PackPurchase,
                )
                .for_submission(submission.id)
                .for_product(product.id)
                .created_by(Some(reviewer_id));
                self.credits.add_ledger_entry(&mut *conn, &entry, at).await?;
                Ok(credits)
            }
            ApprovalGrant::Subscription { monthly_credits } => {
                let mut subscription = self
                    .subscriptions
                    .lock_or_create(
                        &mut *conn,
                        submission.client_id,
                        product.id,
                        monthly_credits,
                        at.date_naive(),
                    )
                    .await?;
                subscription.is_active = true;
                subscription.monthly_credits = monthly_credits;

                let granted = match apply_monthly_topup(&mut subscription, at, Some(reviewer_id)) {
                    Some(entry) => {
                        let entry = entry.for_submission(submission.id);
                        self.credits.add_ledger_entry(&mut *conn, &entry, at).await?;
                        entry.delta
                    }
                    None => 0,
                };
                self.subscriptions.save(&mut *conn, &subscription).await?;
                Ok(granted)
            }
            ApprovalGrant::Nothing => Ok(0),
        }
    }
}
