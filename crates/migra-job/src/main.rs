//! migra-job - people and bank-account migration job

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use migra_common::logging::{init_logging, LogConfig, LogLevel};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use migra_job::config::Config;

#[derive(Parser, Debug)]
#[command(name = "migra-job")]
#[command(author, version, about = "Migrates people and bank-account files into the relational store")]
struct Cli {
    /// People input file
    #[arg(long)]
    people_file: Option<PathBuf>,

    /// Bank-accounts input file
    #[arg(long)]
    bank_accounts_file: Option<PathBuf>,

    /// Output file for people that fail validation
    #[arg(long)]
    invalid_people_file: Option<PathBuf>,

    /// Records per chunk (one batched write per chunk and lane)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the verbose flag wins over LOG_LEVEL
    let mut log_config = LogConfig::from_env().with_file_prefix("migra-job");
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    // Load configuration, then apply CLI overrides
    let mut config = Config::load()?;
    if let Some(path) = cli.people_file {
        config.files.people = path;
    }
    if let Some(path) = cli.bank_accounts_file {
        config.files.bank_accounts = path;
    }
    if let Some(path) = cli.invalid_people_file {
        config.files.invalid_people = path;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.job.chunk_size = chunk_size;
    }
    config.validate()?;

    info!(
        chunk_size = config.job.chunk_size,
        people = %config.files.people.display(),
        bank_accounts = %config.files.bank_accounts.display(),
        "configuration loaded"
    );

    // Initialize database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect(&config.database.url)
        .await?;

    info!("database connection pool established");

    // Exactly one job run per invocation; exit code reflects its outcome
    let job = migra_job::build_job(&config, pool)?;
    let run = job.run().await;

    if !run.succeeded() {
        anyhow::bail!("migration job failed");
    }

    Ok(())
}
