//! Integration tests for the HTTP API.

mod helpers;

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use coachhub_entity::credit::ProductMode;

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_health_reports_database() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "connected");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_book_and_cancel_over_http() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(1, 1).await;
    let client = app.client_with_credits(1).await;

    let response = app
        .request(
            "POST",
            &format!("/api/sessions/{}/bookings", session.id),
            Some(json!({ "client_id": client })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["result"], "booked");
    assert_eq!(response.body["data"]["booking"]["status"], "BOOKED");

    let booking_id = response.body["data"]["booking"]["id"]
        .as_str()
        .expect("booking id")
        .to_string();

    let response = app
        .request("POST", &format!("/api/bookings/{booking_id}/cancel"), Some(json!({})))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["result"], "cancelled");
    assert_eq!(response.body["data"]["late_cancel"], false);

    let response = app
        .request("GET", &format!("/api/clients/{client}/credits"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["available"], 1);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_insufficient_credits_maps_to_402() {
    let app = helpers::TestApp::new().await;
    let (_, session) = app.scheduled_class(2, 0).await;

    let response = app
        .request(
            "POST",
            &format!("/api/sessions/{}/bookings", session.id),
            Some(json!({ "client_id": Uuid::new_v4() })),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.body["error"], "INSUFFICIENT_CREDITS");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_unknown_booking_is_404() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            &format!("/api/bookings/{}/cancel", Uuid::new_v4()),
            Some(json!({})),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_adjustment_validation() {
    let app = helpers::TestApp::new().await;
    let client = Uuid::new_v4();

    let response = app
        .request(
            "POST",
            &format!("/api/clients/{client}/credits/adjustments"),
            Some(json!({ "delta": 1_000_000 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");

    let response = app
        .request(
            "POST",
            &format!("/api/clients/{client}/credits/adjustments"),
            Some(json!({ "delta": 4, "note": "Goodwill" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["balance"], 4);
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_submission_review_flow() {
    let app = helpers::TestApp::new().await;
    let product = app.create_product(ProductMode::OneTimePack, 6, false).await;
    let client = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let response = app
        .request(
            "POST",
            "/api/credit-submissions",
            Some(json!({
                "client_id": client,
                "product_id": product.id,
                "payment_reference": "BANK-7781",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "PENDING");
    let submission_id = response.body["data"]["id"]
        .as_str()
        .expect("submission id")
        .to_string();

    let review = json!({ "action": "APPROVE", "reviewer_id": reviewer });
    let path = format!("/api/credit-submissions/{submission_id}/review");

    let response = app.request("POST", &path, Some(review.clone())).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["credits_applied"], 6);

    let response = app.request("POST", &path, Some(review)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "ALREADY_REVIEWED");
}

#[tokio::test]
#[ignore = "requires COACHHUB_TEST_DATABASE_URL"]
async fn test_monthly_run_endpoint() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("POST", "/api/admin/credits/monthly-run", Some(json!({})))
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert!(response.body["data"]["period_key"].is_string());
}
