//! Credit purchase submission commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use coachhub_core::error::AppError;
use coachhub_database::repositories::SubmissionRepository;
use coachhub_entity::credit::{CreditSubmission, ReviewAction};
use coachhub_service::credit::ReviewService;

use crate::output::{self, OutputFormat};

/// Arguments for the submissions command
#[derive(Debug, Args)]
pub struct SubmissionsArgs {
    /// Submissions subcommand
    #[command(subcommand)]
    pub command: SubmissionsCommand,
}

/// Review decision as typed on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for ReviewAction {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => ReviewAction::Approve,
            Decision::Reject => ReviewAction::Reject,
        }
    }
}

/// Submissions subcommands
#[derive(Debug, Subcommand)]
pub enum SubmissionsCommand {
    /// List submissions awaiting review
    Pending,
    /// Approve or reject a submission
    Review {
        /// Submission ID
        submission_id: Uuid,
        /// Decision
        #[arg(long, value_enum)]
        action: Decision,
        /// Reviewer recorded on the submission
        #[arg(long)]
        reviewer_id: Uuid,
    },
}

/// Submission row for table output
#[derive(Debug, Serialize, Tabled)]
struct SubmissionRow {
    #[tabled(rename = "ID")]
    id: Uuid,
    #[tabled(rename = "Client")]
    client_id: Uuid,
    #[tabled(rename = "Product")]
    product_id: Uuid,
    #[tabled(rename = "Reference")]
    payment_reference: String,
    #[tabled(rename = "Submitted")]
    created_at: String,
}

impl From<&CreditSubmission> for SubmissionRow {
    fn from(s: &CreditSubmission) -> Self {
        Self {
            id: s.id,
            client_id: s.client_id,
            product_id: s.product_id,
            payment_reference: s.payment_reference.clone(),
            created_at: s.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute submissions commands
pub async fn execute(
    args: &SubmissionsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::create_db_pool(&config).await?;

    match &args.command {
        SubmissionsCommand::Pending => {
            let pending = SubmissionRepository::new(pool).find_pending().await?;
            let rows: Vec<SubmissionRow> = pending.iter().map(SubmissionRow::from).collect();
            output::print_list(&rows, format);
        }
        SubmissionsCommand::Review {
            submission_id,
            action,
            reviewer_id,
        } => {
            let outcome = ReviewService::new(pool)
                .review_credit_submission(*submission_id, (*action).into(), *reviewer_id, None)
                .await?;

            match format {
                OutputFormat::Json => output::print_json(&outcome),
                OutputFormat::Table => output::print_success(&format!(
                    "Submission {} {}; {} credits applied",
                    outcome.submission.id, outcome.submission.status, outcome.credits_applied
                )),
            }
        }
    }

    Ok(())
}
