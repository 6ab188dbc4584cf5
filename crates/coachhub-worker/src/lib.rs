//! Background processing for CoachHub.
//!
//! This crate provides:
//! - A job executor that dispatches named jobs to their handlers
//! - A cron scheduler that triggers the monthly credit run
//! - The credit top-up job and the notification delivery loop

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use jobs::{CreditTopupJobHandler, NotificationDeliveryWorker};
pub use scheduler::CronScheduler;
