//! Monthly credit top-up and expiry job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use coachhub_service::credit::MonthlyTopupService;

use crate::executor::{JobExecutionError, JobHandler};

/// Job type the scheduler and CLI dispatch the monthly run under.
pub const CREDIT_TOPUP_JOB: &str = "credit_topup";

/// Optional overrides carried in the job payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreditTopupPayload {
    run_at: Option<DateTime<Utc>>,
    actor_id: Option<Uuid>,
}

/// Runs the monthly top-up and expiry recomputation.
#[derive(Debug)]
pub struct CreditTopupJobHandler {
    service: Arc<MonthlyTopupService>,
}

impl CreditTopupJobHandler {
    /// Create a new credit top-up job handler
    pub fn new(service: Arc<MonthlyTopupService>) -> Self {
        Self { service }
    }
}

fn parse_payload(payload: &Value) -> Result<CreditTopupPayload, JobExecutionError> {
    if payload.is_null() {
        return Ok(CreditTopupPayload::default());
    }
    serde_json::from_value(payload.clone())
        .map_err(|e| JobExecutionError::Permanent(format!("Invalid credit_topup payload: {e}")))
}

#[async_trait]
impl JobHandler for CreditTopupJobHandler {
    fn job_type(&self) -> &str {
        CREDIT_TOPUP_JOB
    }

    async fn execute(&self, payload: &Value) -> Result<Option<Value>, JobExecutionError> {
        let payload = parse_payload(payload)?;
        let report = self
            .service
            .run_monthly_credit_topup_and_expiry(payload.run_at, payload.actor_id)
            .await?;

        tracing::info!(
            period_key = %report.period_key,
            topups_applied = report.topups_applied,
            balances_recalculated = report.balances_recalculated,
            failed = report.failed_subscriptions.len(),
            "Credit top-up job complete"
        );
        Ok(Some(serde_json::to_value(&report).map_err(coachhub_core::AppError::from)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let parsed = parse_payload(&Value::Null).expect("null payload");
        assert!(parsed.run_at.is_none());
        assert!(parsed.actor_id.is_none());

        let parsed = parse_payload(&serde_json::json!({})).expect("empty payload");
        assert!(parsed.run_at.is_none());
    }

    #[test]
    fn test_payload_run_at() {
        let parsed = parse_payload(&serde_json::json!({"run_at": "2026-02-01T00:10:00Z"}))
            .expect("payload");
        assert_eq!(
            parsed.run_at.map(|t| t.to_rfc3339()),
            Some("2026-02-01T00:10:00+00:00".to_string())
        );
    }

    #[test]
    fn test_payload_rejects_garbage() {
        let err = parse_payload(&serde_json::json!({"run_at": 42})).expect_err("bad payload");
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }
}
