//! Integration tests for the credit ledger, submission review, and the
//! monthly top-up run.

mod helpers;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use coachhub_core::error::{ErrorKind, codes};
use coachhub_core::types::MonthKey;
use coachhub_database::repositories::{LedgerRepository, SubscriptionRepository};
use coachhub_entity::credit::{CreditLedgerEntry, LedgerReason, ProductMode, ReviewAction, SubmissionStatus};

async fn subscription_of(app: &helpers::TestApp, client: Uuid) -> Uuid {
    sqlx::query_scalar("SELECT id FROM client_credit_subscriptions WHERE client_id = $1")
        .bind(client)
        .fetch_one(&app.db_pool)
        .await
        .expect("subscription")
}

async fn monthly_grants(app: &helpers::TestApp, client: Uuid) -> Vec<CreditLedgerEntry> {
    LedgerRepository::new(app.db_pool.clone())
        .recent_entries(client, 50)
        .await
        .expect("entries")
        .into_iter()
        .filter(|e| e.reason == LedgerReason::TopupMonthly)
        .collect()
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_admin_adjust_updates_cached_balance() {
    let app = helpers::TestApp::new().await;
    let client = Uuid::new_v4();

    let posting = app
        .ledger
        .admin_adjust(client, 5, None, Some("Welcome credits".to_string()), None)
        .await
        .expect("grant");
    assert_eq!(posting.balance, 5);
    assert_eq!(posting.entry.reason, LedgerReason::AdminAdjust);

    let posting = app
        .ledger
        .admin_adjust(client, -2, None, None, None)
        .await
        .expect("deduct");
    assert_eq!(posting.balance, 3);

    let summary = app.ledger.credit_summary(client, None).await.expect("summary");
    assert_eq!(summary.balance, 3);
    assert_eq!(summary.available, 3);
    assert_eq!(summary.recent_entries.len(), 2);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_zero_adjustment_is_rejected() {
    let app = helpers::TestApp::new().await;

    let err = app
        .ledger
        .admin_adjust(Uuid::new_v4(), 0, None, None, None)
        .await
        .expect_err("zero delta");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_pack_approval_grants_credits_once() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::OneTimePack, 10, false).await;
    let client = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "PAY-1001", Some("Paid at front desk"))
        .await
        .expect("submit");
    assert_eq!(submission.status, SubmissionStatus::Pending);

    let outcome = app
        .review
        .review_credit_submission(submission.id, ReviewAction::Approve, reviewer, None)
        .await
        .expect("approve");
    assert_eq!(outcome.credits_applied, 10);
    assert_eq!(outcome.submission.status, SubmissionStatus::Approved);
    assert_eq!(outcome.submission.reviewed_by, Some(reviewer));
    assert_eq!(app.available(client).await, 10);

    let err = app
        .review
        .review_credit_submission(submission.id, ReviewAction::Approve, reviewer, None)
        .await
        .expect_err("second review");
    assert!(err.is(codes::ALREADY_REVIEWED));
    assert_eq!(app.available(client).await, 10);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_rejection_grants_nothing() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::OneTimePack, 10, false).await;
    let client = Uuid::new_v4();

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "PAY-1002", None)
        .await
        .expect("submit");
    let outcome = app
        .review
        .review_credit_submission(submission.id, ReviewAction::Reject, Uuid::new_v4(), None)
        .await
        .expect("reject");

    assert_eq!(outcome.credits_applied, 0);
    assert_eq!(outcome.submission.status, SubmissionStatus::Rejected);
    assert_eq!(app.available(client).await, 0);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_submission_guards() {
    let app = helpers::TestApp::new().await;
    let client = Uuid::new_v4();

    let provider_only = app.create_product(ProductMode::OneTimePack, 5, true).await;
    let err = app
        .review
        .submit_credit_purchase(client, provider_only.id, "PAY-1", None)
        .await
        .expect_err("provider only");
    assert!(err.is(codes::PROVIDER_ONLY_PRODUCT));

    let inactive = app.create_product(ProductMode::OneTimePack, 5, false).await;
    coachhub_database::repositories::ProductRepository::new(app.db_pool.clone())
        .set_active(inactive.id, false)
        .await
        .expect("deactivate");
    let err = app
        .review
        .submit_credit_purchase(client, inactive.id, "PAY-2", None)
        .await
        .expect_err("inactive");
    assert!(err.is(codes::PRODUCT_INACTIVE));

    let err = app
        .review
        .submit_credit_purchase(client, Uuid::new_v4(), "PAY-3", None)
        .await
        .expect_err("unknown product");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_monthly_subscription_lifecycle() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::MonthlyTopup, 8, false).await;
    let client = Uuid::new_v4();
    let now = Utc::now();

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "SUB-1", None)
        .await
        .expect("submit");
    let outcome = app
        .review
        .review_credit_submission(submission.id, ReviewAction::Approve, Uuid::new_v4(), Some(now))
        .await
        .expect("approve");
    assert_eq!(outcome.credits_applied, 8, "first month is granted on approval");

    app.topup
        .run_monthly_credit_topup_and_expiry(Some(now), None)
        .await
        .expect("same-month run");
    let ledger = LedgerRepository::new(app.db_pool.clone());
    let topups = ledger
        .recent_entries(client, 50)
        .await
        .expect("entries")
        .into_iter()
        .filter(|e| {
            e.reason == LedgerReason::TopupMonthly
                && e.period_key == Some(MonthKey::of(now).to_string())
        })
        .count();
    assert_eq!(topups, 1, "same month is not granted twice");

    let next_month = now + Duration::days(32);
    let report = app
        .topup
        .run_monthly_credit_topup_and_expiry(Some(next_month), None)
        .await
        .expect("next-month run");
    let subscription_id = subscription_of(&app, client).await;
    assert!(!report.failed_subscriptions.contains(&subscription_id));
    assert_eq!(monthly_grants(&app, client).await.len(), 2);

    let summary = app
        .ledger
        .credit_summary(client, Some(next_month))
        .await
        .expect("summary");
    assert_eq!(summary.available, 8, "last month's grant expired");
    assert_eq!(summary.balance, 8);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_monthly_approval_with_past_timestamp_grants_that_month() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::MonthlyTopup, 8, false).await;
    let client = Uuid::new_v4();
    let approved_at: DateTime<Utc> = "2026-02-21T12:00:00Z".parse().expect("timestamp");

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "SUB-FEB", None)
        .await
        .expect("submit");
    let outcome = app
        .review
        .review_credit_submission(
            submission.id,
            ReviewAction::Approve,
            Uuid::new_v4(),
            Some(approved_at),
        )
        .await
        .expect("approve");
    assert_eq!(outcome.credits_applied, 8);

    let starts_on: Option<chrono::NaiveDate> = sqlx::query_scalar(
        "SELECT starts_on FROM client_credit_subscriptions WHERE client_id = $1",
    )
    .bind(client)
    .fetch_one(&app.db_pool)
    .await
    .expect("subscription");
    assert_eq!(starts_on, Some(approved_at.date_naive()));

    let february: Vec<_> = monthly_grants(&app, client)
        .await
        .into_iter()
        .filter(|e| e.period_key.as_deref() == Some("2026-02"))
        .collect();
    assert_eq!(february.len(), 1);
    assert_eq!(february[0].delta, 8);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_run_for_earlier_month_after_later_month_is_a_no_op() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::MonthlyTopup, 6, false).await;
    let client = Uuid::new_v4();
    let now = Utc::now();

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "SUB-ORDER", None)
        .await
        .expect("submit");
    app.review
        .review_credit_submission(submission.id, ReviewAction::Approve, Uuid::new_v4(), Some(now))
        .await
        .expect("approve");
    let subscription_id = subscription_of(&app, client).await;

    let later = app
        .topup
        .run_monthly_credit_topup_and_expiry(Some(now + Duration::days(32)), None)
        .await
        .expect("later month");
    assert!(!later.failed_subscriptions.contains(&subscription_id));

    let earlier = app
        .topup
        .run_monthly_credit_topup_and_expiry(Some(now), None)
        .await
        .expect("earlier month runs to completion");
    assert!(!earlier.failed_subscriptions.contains(&subscription_id));

    let grants = monthly_grants(&app, client).await;
    assert_eq!(grants.len(), 2);
    let last_applied: Option<String> = sqlx::query_scalar(
        "SELECT last_applied_month FROM client_credit_subscriptions WHERE id = $1",
    )
    .bind(subscription_id)
    .fetch_one(&app.db_pool)
    .await
    .expect("marker");
    assert_eq!(
        last_applied,
        Some(MonthKey::of(now + Duration::days(32)).to_string())
    );
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_inactive_subscription_is_skipped() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::MonthlyTopup, 4, false).await;
    let client = Uuid::new_v4();

    let submission = app
        .review
        .submit_credit_purchase(client, product.id, "SUB-2", None)
        .await
        .expect("submit");
    app.review
        .review_credit_submission(submission.id, ReviewAction::Approve, Uuid::new_v4(), None)
        .await
        .expect("approve");

    let subscription_id = subscription_of(&app, client).await;
    SubscriptionRepository::new(app.db_pool.clone())
        .deactivate(subscription_id)
        .await
        .expect("deactivate");

    let next_month = Utc::now() + Duration::days(32);
    app.topup
        .run_monthly_credit_topup_and_expiry(Some(next_month), None)
        .await
        .expect("run");

    let available = app
        .ledger
        .get_available_credits(client, next_month)
        .await
        .expect("available");
    assert_eq!(available, 0);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_ledger_rows_are_append_only() {
    let app = helpers::TestApp::new().await;
    let client = app.client_with_credits(2).await;
    app.ledger
        .admin_adjust(client, -1, None, None, None)
        .await
        .expect("deduct");

    let entries = LedgerRepository::new(app.db_pool.clone())
        .recent_entries(client, 10)
        .await
        .expect("entries");
    let deltas: Vec<i64> = entries.iter().map(|e| e.delta).collect();
    assert_eq!(entries.len(), 2);
    assert!(deltas.contains(&2));
    assert!(deltas.contains(&-1));
}
