//! CLI command definitions and dispatch.

pub mod credits;
pub mod migrate;
pub mod submissions;

use clap::{Parser, Subcommand};

use coachhub_core::config::AppConfig;
use coachhub_core::error::AppError;

use crate::output::OutputFormat;

/// CoachHub class booking and credit administration
#[derive(Debug, Parser)]
#[command(name = "coachhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Client credits and the monthly run
    Credits(credits::CreditsArgs),
    /// Credit purchase submissions
    Submissions(submissions::SubmissionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config).await,
            Commands::Credits(args) => credits::execute(args, &self.config, self.format).await,
            Commands::Submissions(args) => {
                submissions::execute(args, &self.config, self.format).await
            }
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_from(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    coachhub_database::connection::connect(&config.database).await
}
