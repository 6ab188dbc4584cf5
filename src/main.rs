//! CoachHub server for class scheduling and client credits
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use coachhub_core::config::AppConfig;
use coachhub_core::error::AppError;
use coachhub_core::traits::{BookingNotifier, SettingsProvider};
use coachhub_database::repositories::NotificationRepository;
use coachhub_service::{
    BookingService, ConfigSettingsProvider, CreditLedgerService, MonthlyTopupService,
    NotificationDispatcher, ReviewService,
};
use coachhub_worker::{CreditTopupJobHandler, CronScheduler, JobExecutor, NotificationDeliveryWorker};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `COACHHUB_CONFIG` or the default file plus the
/// `COACHHUB_ENV` overlay.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("COACHHUB_CONFIG") {
        Ok(path) => AppConfig::load_from(&path),
        Err(_) => {
            let env = std::env::var("COACHHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CoachHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = coachhub_database::connection::connect(&config.database).await?;

    coachhub_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Notifications ────────────────────────────────────
    let (dispatcher, notification_rx) =
        NotificationDispatcher::channel(config.worker.notification_buffer);
    let notifier: Arc<dyn BookingNotifier> = Arc::new(dispatcher);

    // ── Step 3: Services ─────────────────────────────────────────
    let settings: Arc<dyn SettingsProvider> =
        Arc::new(ConfigSettingsProvider::new(config.booking.clone()));
    let booking_service = Arc::new(BookingService::new(
        db_pool.clone(),
        settings,
        Arc::clone(&notifier),
    ));
    let ledger_service = Arc::new(CreditLedgerService::new(db_pool.clone()));
    let review_service = Arc::new(ReviewService::new(db_pool.clone()));
    let topup_service = Arc::new(MonthlyTopupService::new(db_pool.clone()));
    tracing::info!("Services initialized");

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Notification delivery ────────────────────────────
    let delivery_worker = NotificationDeliveryWorker::new(NotificationRepository::new(db_pool.clone()));
    let delivery_cancel = shutdown_rx.clone();
    let delivery_handle = tokio::spawn(async move {
        delivery_worker.run(notification_rx, delivery_cancel).await;
    });

    // ── Step 6: Scheduled credit maintenance ─────────────────────
    let mut scheduler = if config.worker.enabled {
        let mut job_executor = JobExecutor::new();
        job_executor.register(Arc::new(CreditTopupJobHandler::new(Arc::clone(&topup_service))));

        let scheduler = CronScheduler::new(Arc::new(job_executor), config.worker.clone()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        tracing::info!("Credit scheduler started");
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 7: Build and start HTTP server ──────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = config.server.bind_address();

    let app_state = coachhub_api::AppState {
        config: Arc::new(config),
        db: db_pool,
        booking_service,
        ledger_service,
        review_service,
        topup_service,
    };
    let app = coachhub_api::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("CoachHub server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    if let Some(scheduler) = scheduler.as_mut()
        && let Err(e) = scheduler.shutdown().await
    {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }
    if tokio::time::timeout(grace, delivery_handle).await.is_err() {
        tracing::warn!("Notification delivery did not finish within {:?}", grace);
    }

    tracing::info!("CoachHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
