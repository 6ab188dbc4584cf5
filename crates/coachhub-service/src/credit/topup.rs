//! Monthly credit top-ups and expiry recomputation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_core::types::MonthKey;
use coachhub_database::repositories::{LedgerRepository, SubscriptionRepository};
use coachhub_entity::credit::{ClientCreditSubscription, LedgerReason, NewLedgerEntry};

use super::ledger::CreditLedgerService;

/// Whether a subscription has already received its grant for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopupMarker {
    /// The grant for this month exists.
    AppliedForMonth(MonthKey),
    /// The grant for this month is still owed.
    PendingForMonth(MonthKey),
}

impl TopupMarker {
    /// Read the marker of `subscription` for `month`. A grant for a later
    /// month also covers every earlier one.
    pub fn for_subscription(subscription: &ClientCreditSubscription, month: MonthKey) -> Self {
        let applied = subscription
            .last_applied_month
            .as_deref()
            .and_then(|s| s.parse::<MonthKey>().ok());
        if applied.is_some_and(|last| last >= month) {
            Self::AppliedForMonth(month)
        } else {
            Self::PendingForMonth(month)
        }
    }

    pub fn month(&self) -> MonthKey {
        match self {
            Self::AppliedForMonth(m) | Self::PendingForMonth(m) => *m,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingForMonth(_))
    }
}

/// Whether `subscription` is owed its grant for the month containing `at`.
pub fn should_apply_monthly_topup(subscription: &ClientCreditSubscription, at: DateTime<Utc>) -> bool {
    if !subscription.is_active {
        return false;
    }
    let today = at.date_naive();
    if subscription.starts_on.is_some_and(|d| today < d) {
        return false;
    }
    if subscription.ends_on.is_some_and(|d| today > d) {
        return false;
    }
    TopupMarker::for_subscription(subscription, MonthKey::of(at)).is_pending()
}

/// Produce this month's grant and advance the marker, or `None` when
/// nothing is owed.
pub fn apply_monthly_topup(
    subscription: &mut ClientCreditSubscription,
    at: DateTime<Utc>,
    actor_id: Option<Uuid>,
) -> Option<NewLedgerEntry> {
    if !should_apply_monthly_topup(subscription, at) {
        return None;
    }
    let month = MonthKey::of(at);
    subscription.last_applied_month = Some(month.to_string());

    Some(
        NewLedgerEntry::new(
            subscription.client_id,
            i64::from(subscription.monthly_credits),
            LedgerReason::TopupMonthly,
        )
        .for_product(subscription.product_id)
        .for_subscription(subscription.id, month.to_string())
        .expiring_at(month.end_utc())
        .created_by(actor_id),
    )
}

/// Summary of one top-up and expiry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopupRunReport {
    /// Month the run granted for.
    pub period_key: String,
    /// Grants appended by this run.
    pub topups_applied: usize,
    /// Clients whose balance was recomputed for expiry.
    pub balances_recalculated: usize,
    /// Sorted union of granted and expiry-recomputed clients.
    pub touched_clients: Vec<Uuid>,
    /// Subscriptions whose grant failed; a later run retries them.
    pub failed_subscriptions: Vec<Uuid>,
}

/// Grants monthly credits and refreshes balances after expiry.
#[derive(Debug, Clone)]
pub struct MonthlyTopupService {
    pool: PgPool,
    subscriptions: SubscriptionRepository,
    ledger: LedgerRepository,
    credits: CreditLedgerService,
}

impl MonthlyTopupService {
    /// Create a new top-up service.
    pub fn new(pool: PgPool) -> Self {
        Self {
            subscriptions: SubscriptionRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            credits: CreditLedgerService::new(pool.clone()),
            pool,
        }
    }

    /// Grant every owed top-up for the month of `run_at`, then recompute the
    /// cached balance of every client holding expired credits.
    ///
    /// Each subscription is granted in its own transaction, so a run that
    /// stops halfway can simply be started again.
    pub async fn run_monthly_credit_topup_and_expiry(
        &self,
        run_at: Option<DateTime<Utc>>,
        actor_id: Option<Uuid>,
    ) -> AppResult<TopupRunReport> {
        let run_at = run_at.unwrap_or_else(Utc::now);
        let period_key = MonthKey::of(run_at).to_string();
        info!(%period_key, %run_at, "Starting monthly credit run");

        let mut topup_clients = BTreeSet::new();
        let mut topups_applied = 0;
        let mut failed_subscriptions = Vec::new();
        for subscription_id in self.subscriptions.find_active_monthly_ids().await? {
            match self.grant_one(subscription_id, run_at, actor_id).await {
                Ok(Some(client_id)) => {
                    topups_applied += 1;
                    topup_clients.insert(client_id);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%subscription_id, error = %e, "Monthly top-up failed, continuing");
                    failed_subscriptions.push(subscription_id);
                }
            }
        }

        let expired_clients = self.ledger.clients_with_expired_entries(run_at).await?;
        self.recalculate(&expired_clients, run_at).await?;

        let mut touched: BTreeSet<Uuid> = topup_clients;
        touched.extend(expired_clients.iter().copied());

        let report = TopupRunReport {
            period_key,
            topups_applied,
            balances_recalculated: expired_clients.len(),
            touched_clients: touched.into_iter().collect(),
            failed_subscriptions,
        };
        info!(
            period_key = %report.period_key,
            topups_applied = report.topups_applied,
            balances_recalculated = report.balances_recalculated,
            failed = report.failed_subscriptions.len(),
            "Monthly credit run finished"
        );
        Ok(report)
    }

    async fn grant_one(
        &self,
        subscription_id: Uuid,
        run_at: DateTime<Utc>,
        actor_id: Option<Uuid>,
    ) -> AppResult<Option<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let Some(mut subscription) = self.subscriptions.lock(&mut *tx, subscription_id).await?
        else {
            warn!(%subscription_id, "Subscription vanished before top-up");
            return Ok(None);
        };
        let Some(entry) = apply_monthly_topup(&mut subscription, run_at, actor_id) else {
            return Ok(None);
        };

        self.credits.add_ledger_entry(&mut *tx, &entry, run_at).await?;
        self.subscriptions.save(&mut *tx, &subscription).await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit top-up", e)
        })?;

        info!(
            %subscription_id,
            client_id = %subscription.client_id,
            credits = subscription.monthly_credits,
            "Monthly top-up granted"
        );
        Ok(Some(subscription.client_id))
    }

    async fn recalculate(&self, clients: &[Uuid], at: DateTime<Utc>) -> AppResult<()> {
        if clients.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        self.ledger.lock_accounts(&mut *tx, clients).await?;
        for client_id in clients {
            self.ledger.refresh_balance(&mut *tx, *client_id, at).await?;
        }
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit balance refresh", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn subscription() -> ClientCreditSubscription {
        let created: DateTime<Utc> = "2026-01-05T09:00:00Z".parse().expect("timestamp");
        ClientCreditSubscription {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            monthly_credits: 8,
            is_active: true,
            starts_on: None,
            ends_on: None,
            last_applied_month: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    #[test]
    fn test_applies_once_per_month() {
        let mut sub = subscription();
        let now = at("2026-02-21T12:00:00Z");
        assert!(should_apply_monthly_topup(&sub, now));

        let entry = apply_monthly_topup(&mut sub, now, None).expect("grant");
        assert_eq!(sub.last_applied_month.as_deref(), Some("2026-02"));
        assert!(!should_apply_monthly_topup(&sub, now));
        assert!(apply_monthly_topup(&mut sub, now, None).is_none());

        assert_eq!(entry.delta, 8);
        assert_eq!(entry.reason, LedgerReason::TopupMonthly);
        assert_eq!(entry.period_key.as_deref(), Some("2026-02"));
        assert_eq!(entry.subscription_id, Some(sub.id));
        assert_eq!(entry.expires_at, Some(at("2026-02-28T23:59:59.999Z")));

        assert!(should_apply_monthly_topup(&sub, at("2026-03-01T00:00:00Z")));
    }

    #[test]
    fn test_earlier_month_after_later_grant_is_skipped() {
        let mut sub = subscription();
        assert!(apply_monthly_topup(&mut sub, at("2026-03-02T08:00:00Z"), None).is_some());

        assert!(!should_apply_monthly_topup(&sub, at("2026-02-21T12:00:00Z")));
        assert!(apply_monthly_topup(&mut sub, at("2026-02-21T12:00:00Z"), None).is_none());
        assert_eq!(sub.last_applied_month.as_deref(), Some("2026-03"));
    }

    #[test]
    fn test_inactive_never_applies() {
        let mut sub = subscription();
        sub.is_active = false;
        assert!(!should_apply_monthly_topup(&sub, at("2026-02-21T12:00:00Z")));
    }

    #[test]
    fn test_respects_start_and_end_dates() {
        let mut sub = subscription();
        sub.starts_on = NaiveDate::from_ymd_opt(2026, 2, 10);
        sub.ends_on = NaiveDate::from_ymd_opt(2026, 4, 30);

        assert!(!should_apply_monthly_topup(&sub, at("2026-02-09T23:00:00Z")));
        assert!(should_apply_monthly_topup(&sub, at("2026-02-10T00:00:00Z")));
        assert!(should_apply_monthly_topup(&sub, at("2026-04-30T20:00:00Z")));
        assert!(!should_apply_monthly_topup(&sub, at("2026-05-01T00:00:00Z")));
    }

    #[test]
    fn test_marker_reads_last_applied_month() {
        let mut sub = subscription();
        let feb = MonthKey::new(2026, 2).expect("month");
        assert_eq!(
            TopupMarker::for_subscription(&sub, feb),
            TopupMarker::PendingForMonth(feb)
        );

        sub.last_applied_month = Some("2026-02".to_string());
        let marker = TopupMarker::for_subscription(&sub, feb);
        assert_eq!(marker, TopupMarker::AppliedForMonth(feb));
        assert!(!marker.is_pending());
        assert_eq!(marker.month(), feb);

        sub.last_applied_month = Some("2026-03".to_string());
        assert_eq!(
            TopupMarker::for_subscription(&sub, feb),
            TopupMarker::AppliedForMonth(feb)
        );
        sub.last_applied_month = Some("2026-01".to_string());
        assert!(TopupMarker::for_subscription(&sub, feb).is_pending());

        sub.last_applied_month = Some("garbage".to_string());
        assert!(TopupMarker::for_subscription(&sub, feb).is_pending());
    }
}
