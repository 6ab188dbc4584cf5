//! Credit balance, adjustment, and monthly run commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use coachhub_core::error::AppError;
use coachhub_entity::credit::CreditLedgerEntry;
use coachhub_service::credit::{CreditLedgerService, MonthlyTopupService};

use crate::output::{self, OutputFormat};

/// Arguments for the credits command
#[derive(Debug, Args)]
pub struct CreditsArgs {
    /// Credits subcommand
    #[command(subcommand)]
    pub command: CreditsCommand,
}

/// Credits subcommands
#[derive(Debug, Subcommand)]
pub enum CreditsCommand {
    /// Grant owed monthly top-ups and refresh expired balances
    Topup {
        /// Evaluate the run at this instant (RFC 3339)
        #[arg(long)]
        run_at: Option<DateTime<Utc>>,
        /// Operator recorded on the ledger entries
        #[arg(long)]
        actor_id: Option<Uuid>,
    },
    /// Show a client's balance and recent ledger entries
    Balance {
        /// Client ID
        client_id: Uuid,
        /// Evaluate availability at this instant (RFC 3339)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Append a manual adjustment
    Adjust {
        /// Client ID
        client_id: Uuid,
        /// Signed credit delta
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
        /// Reason for the adjustment
        #[arg(long)]
        note: Option<String>,
        /// Operator recorded on the entry
        #[arg(long)]
        actor_id: Option<Uuid>,
    },
}

/// Ledger entry row for table output
#[derive(Debug, Serialize, Tabled)]
struct LedgerRow {
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Delta")]
    delta: i64,
    #[tabled(rename = "Expires")]
    expires_at: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl From<&CreditLedgerEntry> for LedgerRow {
    fn from(entry: &CreditLedgerEntry) -> Self {
        Self {
            created_at: entry.created_at.format("%Y-%m-%d %H:%M").to_string(),
            reason: entry.reason.to_string(),
            delta: entry.delta,
            expires_at: entry
                .expires_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            note: entry.note.clone().unwrap_or_default(),
        }
    }
}

/// Execute credits commands
pub async fn execute(
    args: &CreditsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::create_db_pool(&config).await?;

    match &args.command {
        CreditsCommand::Topup { run_at, actor_id } => {
            let service = MonthlyTopupService::new(pool);
            let report = service
                .run_monthly_credit_topup_and_expiry(*run_at, *actor_id)
                .await?;

            match format {
                OutputFormat::Json => output::print_json(&report),
                OutputFormat::Table => {
                    output::print_success(&format!("Monthly credit run for {}", report.period_key));
                    output::print_kv("Top-ups applied", &report.topups_applied.to_string());
                    output::print_kv(
                        "Balances recalculated",
                        &report.balances_recalculated.to_string(),
                    );
                    output::print_kv("Clients touched", &report.touched_clients.len().to_string());
                    output::print_kv(
                        "Failed subscriptions",
                        &report.failed_subscriptions.len().to_string(),
                    );
                }
            }
        }
        CreditsCommand::Balance { client_id, at } => {
            let service = CreditLedgerService::new(pool);
            let summary = service.credit_summary(*client_id, *at).await?;

            match format {
                OutputFormat::Json => output::print_json(&summary),
                OutputFormat::Table => {
                    output::print_kv("Client", &summary.client_id.to_string());
                    output::print_kv("Cached balance", &summary.balance.to_string());
                    output::print_kv("Available", &summary.available.to_string());
                    output::print_kv("As of", &summary.as_of.to_rfc3339());
                    println!();
                    let rows: Vec<LedgerRow> =
                        summary.recent_entries.iter().map(LedgerRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        CreditsCommand::Adjust {
            client_id,
            delta,
            note,
            actor_id,
        } => {
            let service = CreditLedgerService::new(pool);
            let posting = service
                .admin_adjust(*client_id, *delta, *actor_id, note.clone(), None)
                .await?;

            match format {
                OutputFormat::Json => output::print_json(&posting),
                OutputFormat::Table => output::print_success(&format!(
                    "Adjusted {} by {}; balance is now {}",
                    client_id, delta, posting.balance
                )),
            }
        }
    }

    Ok(())
}
