//! Cron scheduler for periodic credit maintenance.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use coachhub_core::config::WorkerConfig;
use coachhub_core::error::AppError;

use crate::executor::JobExecutor;
use crate::jobs::credit_topup::CREDIT_TOPUP_JOB;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("credit_topup_cron", &self.config.credit_topup_cron)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
            config,
        })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_credit_topup().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Monthly credit top-up and expiry, idempotent so it can run daily
    async fn register_credit_topup(&self) -> Result<(), AppError> {
        let executor = Arc::clone(&self.executor);
        let cron = self.config.credit_topup_cron.as_str();
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            Box::pin(async move {
                tracing::debug!("Running scheduled credit top-up");
                if let Err(e) = executor
                    .execute(CREDIT_TOPUP_JOB, &serde_json::Value::Null)
                    .await
                {
                    tracing::error!(error = %e, "Scheduled credit top-up failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid credit top-up schedule '{cron}': {e}"))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add credit top-up schedule: {e}"))
        })?;

        tracing::info!(%cron, "Registered: credit_topup");
        Ok(())
    }
}
