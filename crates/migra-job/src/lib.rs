//! Migra Job Library
//!
//! Batch engine that migrates two delimited-file record sets, people and bank
//! accounts, into the relational store. Records that fail validation are
//! routed to a side file instead of the database.
//!
//! Architecture:
//!
//! - Read: flat-file record sources with explicit field-by-position decoders
//! - Route: per-record lane classification (people only)
//! - Write: batched, all-or-nothing sink flushes per chunk and lane
//! - Orchestrate: both entity pipelines run concurrently, one join point
//!
//! # Example
//!
//! ```no_run
//! use migra_job::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = sqlx::PgPool::connect(&config.database.url).await?;
//!     let job = migra_job::build_job(&config, pool)?;
//!     let run = job.run().await;
//!     assert!(run.succeeded());
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use error::{JobError, Result};
pub use orchestrator::{JobRun, JobStatus, MigrationJob};
pub use pipeline::{ChunkedPipeline, PipelineReport};

use crate::classify::classify;
use crate::models::{BankAccount, Person};
use crate::sink::{BankAccountDbSink, PersonDbSink, RejectedPersonSink};
use crate::source::FlatFileSource;

/// One job run's worth of wiring: sources, sinks, and pipelines built from
/// plain constructor calls, no runtime injection.
pub type ConfiguredJob = MigrationJob<FlatFileSource<Person>, FlatFileSource<BankAccount>>;

/// Build the migration job from loaded configuration and a ready pool.
///
/// Each sink owns its destination resource exclusively for the duration of
/// its pipeline; the pool is the one resource shared across the two
/// concurrent writers.
pub fn build_job(config: &config::Config, pool: sqlx::PgPool) -> Result<ConfiguredJob> {
    let marker = config.job.comment_marker.as_str();

    let people = ChunkedPipeline::classified(
        "person",
        FlatFileSource::open(&config.files.people, marker)?,
        config.job.chunk_size,
        classify,
        Box::new(PersonDbSink::new(pool.clone())),
        Box::new(RejectedPersonSink::create(&config.files.invalid_people)?),
    );

    let bank_accounts = ChunkedPipeline::single_lane(
        "bank_account",
        FlatFileSource::open(&config.files.bank_accounts, marker)?,
        config.job.chunk_size,
        Box::new(BankAccountDbSink::new(pool)),
    );

    Ok(MigrationJob::new(people, bank_accounts))
}
