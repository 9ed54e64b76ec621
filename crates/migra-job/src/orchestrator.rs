//! Job-level orchestration
//!
//! Runs the person pipeline and the bank-account pipeline as independent
//! concurrent tasks, waits for both, and reports a single aggregate outcome.
//! The two pipelines share no state, sources, or sinks; a failure in one
//! never cancels the other, which always runs to its own terminal state.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{JobError, Result};
use crate::models::{BankAccount, Person};
use crate::pipeline::{ChunkedPipeline, PipelineReport};
use crate::source::RecordSource;

/// Job run state machine: `NotStarted -> Running -> {Succeeded, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// Terminal result of one pipeline.
pub type PipelineOutcome = Result<PipelineReport>;

/// Aggregate outcome of one job run, reported exactly once.
#[derive(Debug)]
pub struct JobRun {
    pub status: JobStatus,
    pub people: PipelineOutcome,
    pub bank_accounts: PipelineOutcome,
}

impl JobRun {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// One invocation's migration job: both entity pipelines plus the join
/// point. A job is not retried; a fresh invocation builds a fresh job.
pub struct MigrationJob<PS, BS> {
    people: ChunkedPipeline<Person, PS>,
    bank_accounts: ChunkedPipeline<BankAccount, BS>,
    status: JobStatus,
}

impl<PS, BS> MigrationJob<PS, BS>
where
    PS: RecordSource<Record = Person> + Send + 'static,
    BS: RecordSource<Record = BankAccount> + Send + 'static,
{
    pub fn new(
        people: ChunkedPipeline<Person, PS>,
        bank_accounts: ChunkedPipeline<BankAccount, BS>,
    ) -> Self {
        Self {
            people,
            bank_accounts,
            status: JobStatus::NotStarted,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Run both pipelines to completion and aggregate their outcomes.
    ///
    /// The job succeeds only when both pipelines succeed. On failure the
    /// partial output of already-flushed batches is retained; the migration
    /// is not globally transactional.
    pub async fn run(mut self) -> JobRun {
        self.status = JobStatus::Running;
        info!("migration job started");

        let people_task: JoinHandle<PipelineOutcome> = tokio::spawn(self.people.run());
        let accounts_task: JoinHandle<PipelineOutcome> = tokio::spawn(self.bank_accounts.run());

        // Single join point: wait for both terminal states, in either order.
        let (people_joined, accounts_joined) = tokio::join!(people_task, accounts_task);

        let people = flatten_join(people_joined);
        let bank_accounts = flatten_join(accounts_joined);

        let status = if people.is_ok() && bank_accounts.is_ok() {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };

        match status {
            JobStatus::Succeeded => info!("migration job succeeded"),
            _ => {
                if let Err(err) = &people {
                    error!(entity = "person", error = %err, "pipeline failure");
                }
                if let Err(err) = &bank_accounts {
                    error!(entity = "bank_account", error = %err, "pipeline failure");
                }
                error!("migration job failed");
            },
        }

        JobRun {
            status,
            people,
            bank_accounts,
        }
    }
}

fn flatten_join(joined: std::result::Result<PipelineOutcome, tokio::task::JoinError>) -> PipelineOutcome {
    match joined {
        Ok(outcome) => outcome,
        Err(join_err) => Err(JobError::Aborted(join_err.to_string())),
    }
}
