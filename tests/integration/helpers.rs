//! Shared test helpers for integration tests.
//!
//! Every test needs a PostgreSQL database reachable through
//! `COACHHUB_TEST_DATABASE_URL`. Fixtures use fresh UUIDs so tests can run
//! in parallel against the same database without cleaning it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Duration, Utc};
use http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use coachhub_core::config::{
    AppConfig, BookingDefaults, DatabaseConfig, LoggingConfig, ServerConfig, WorkerConfig,
};
use coachhub_core::events::BookingNotification;
use coachhub_core::traits::{BookingNotifier, SettingsProvider};
use coachhub_database::repositories::class::CreateTemplate;
use coachhub_database::repositories::product::CreateProduct;
use coachhub_database::repositories::{ClassRepository, ProductRepository};
use coachhub_entity::class::{ClassSession, ClassTemplate};
use coachhub_entity::credit::{CreditProduct, ProductMode};
use coachhub_service::{
    BookingService, ConfigSettingsProvider, CreditLedgerService, MonthlyTopupService,
    NotificationDispatcher, ReviewService,
};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Database pool for direct queries
    pub db_pool: PgPool,
    /// Services wired the same way the server wires them
    pub booking: Arc<BookingService>,
    pub ledger: Arc<CreditLedgerService>,
    pub review: Arc<ReviewService>,
    pub topup: Arc<MonthlyTopupService>,
    /// Notifications published by the booking service
    pub notifications: mpsc::Receiver<BookingNotification>,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let url = std::env::var("COACHHUB_TEST_DATABASE_URL")
            .expect("COACHHUB_TEST_DATABASE_URL must point at a test database");
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::with_url(url),
            booking: BookingDefaults::default(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        };

        let db_pool = coachhub_database::connection::connect(&config.database)
            .await
            .expect("Failed to connect to test database");

        coachhub_database::migration::run_migrations(&db_pool)
            .await
            .expect("Failed to run migrations");

        let (dispatcher, notifications) = NotificationDispatcher::channel(256);
        let notifier: Arc<dyn BookingNotifier> = Arc::new(dispatcher);
        let settings: Arc<dyn SettingsProvider> =
            Arc::new(ConfigSettingsProvider::new(config.booking.clone()));

        let booking = Arc::new(BookingService::new(db_pool.clone(), settings, notifier));
        let ledger = Arc::new(CreditLedgerService::new(db_pool.clone()));
        let review = Arc::new(ReviewService::new(db_pool.clone()));
        let topup = Arc::new(MonthlyTopupService::new(db_pool.clone()));

        let state = coachhub_api::AppState {
            config: Arc::new(config),
            db: db_pool.clone(),
            booking_service: Arc::clone(&booking),
            ledger_service: Arc::clone(&ledger),
            review_service: Arc::clone(&review),
            topup_service: Arc::clone(&topup),
        };
        let router = coachhub_api::build_app(state);

        Self {
            router,
            db_pool,
            booking,
            ledger,
            review,
            topup,
            notifications,
        }
    }

    /// Create a template with the given seat and waitlist capacity
    pub async fn create_template(
        &self,
        capacity: i32,
        waitlist_capacity: i32,
        cancel_cutoff_minutes: i32,
    ) -> ClassTemplate {
        ClassRepository::new(self.db_pool.clone())
            .create_template(&CreateTemplate {
                name: "Strength Foundations".to_string(),
                class_type: "strength".to_string(),
                location_label: Some("Main Studio".to_string()),
                room_label: Some("Room A".to_string()),
                capacity: Some(capacity),
                waitlist_enabled: waitlist_capacity > 0,
                waitlist_capacity: Some(waitlist_capacity),
                booking_open_hours_before: Some(336),
                booking_close_minutes_before: Some(0),
                cancel_cutoff_minutes: Some(cancel_cutoff_minutes),
                credits_required: Some(1),
                coach_id: Uuid::new_v4(),
            })
            .await
            .expect("Failed to create template")
    }

    /// Create a one-hour session of `template` starting at `starts_at`
    pub async fn create_session(
        &self,
        template: &ClassTemplate,
        starts_at: DateTime<Utc>,
    ) -> ClassSession {
        ClassRepository::new(self.db_pool.clone())
            .create_session(template.id, starts_at, starts_at + Duration::hours(1), None, None)
            .await
            .expect("Failed to create session")
    }

    /// Template plus a session starting in two days
    pub async fn scheduled_class(
        &self,
        capacity: i32,
        waitlist_capacity: i32,
    ) -> (ClassTemplate, ClassSession) {
        let template = self.create_template(capacity, waitlist_capacity, 720).await;
        let session = self
            .create_session(&template, Utc::now() + Duration::days(2))
            .await;
        (template, session)
    }

    /// Create a product
    pub async fn create_product(
        &self,
        mode: ProductMode,
        credits: i32,
        provider_only_purchase: bool,
    ) -> CreditProduct {
        ProductRepository::new(self.db_pool.clone())
            .create(&CreateProduct {
                name: format!("{mode:?} {credits}"),
                mode,
                credits,
                eligible_class_types: vec!["strength".to_string()],
                price_cents: 12_000,
                currency: "USD".to_string(),
                provider_only_purchase,
            })
            .await
            .expect("Failed to create product")
    }

    /// Create a client holding `credits` non-expiring credits
    pub async fn client_with_credits(&self, credits: i64) -> Uuid {
        let client_id = Uuid::new_v4();
        if credits != 0 {
            self.ledger
                .admin_adjust(client_id, credits, None, Some("Test grant".to_string()), None)
                .await
                .expect("Failed to grant credits");
        }
        client_id
    }

    /// Available credits right now
    pub async fn available(&self, client_id: Uuid) -> i64 {
        self.ledger
            .get_available_credits(client_id, Utc::now())
            .await
            .expect("Failed to read credits")
    }

    /// Notifications received so far
    pub fn drain_notifications(&mut self) -> Vec<BookingNotification> {
        let mut received = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            received.push(notification);
        }
        received
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
