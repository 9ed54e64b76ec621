//! In-memory sources, sinks, and fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{JobError, Result};
use crate::models::{BankAccount, Person};
use crate::sink::BatchSink;
use crate::source::RecordSource;

/// A person fixture; blank name makes it invalid.
pub(crate) fn person(id: i32, name: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
        email: format!("person{id}@x.com"),
        birth_date: chrono::NaiveDateTime::parse_from_str(
            "1990-01-01 00:00:00",
            crate::models::BIRTH_DATE_FORMAT,
        )
        .ok(),
        age: 30,
    }
}

pub(crate) fn bank_account(id: i32, person_id: i32) -> BankAccount {
    BankAccount {
        id,
        person_id,
        branch: 341,
        account: 55000 + id,
        bank: 341,
    }
}

/// The error a scripted source raises at its failure point.
pub(crate) fn scripted_failure() -> JobError {
    JobError::Parse {
        file: "scripted".into(),
        line: 99,
        message: "injected read failure".to_string(),
    }
}

enum SourceEvent<R> {
    Record(R),
    Fail(JobError),
}

/// Replays a scripted sequence of records, optionally ending in an error
/// instead of end-of-stream.
pub(crate) struct ScriptedSource<R> {
    events: VecDeque<SourceEvent<R>>,
}

impl<R> ScriptedSource<R> {
    pub(crate) fn from_records(records: Vec<R>) -> Self {
        Self {
            events: records.into_iter().map(SourceEvent::Record).collect(),
        }
    }

    pub(crate) fn with_failure_after(records: Vec<R>, error: JobError) -> Self {
        let mut events: VecDeque<SourceEvent<R>> =
            records.into_iter().map(SourceEvent::Record).collect();
        events.push_back(SourceEvent::Fail(error));
        Self { events }
    }
}

impl<R> RecordSource for ScriptedSource<R> {
    type Record = R;

    fn next_record(&mut self) -> Result<Option<R>> {
        match self.events.pop_front() {
            Some(SourceEvent::Record(record)) => Ok(Some(record)),
            Some(SourceEvent::Fail(error)) => Err(error),
            None => Ok(None),
        }
    }
}

/// Shared handle onto the batches a [`MemorySink`] has committed.
pub(crate) type CommittedBatches<R> = Arc<Mutex<Vec<Vec<R>>>>;

/// Records every committed batch; optionally fails on the nth write call,
/// leaving earlier batches committed.
pub(crate) struct MemorySink<R> {
    batches: CommittedBatches<R>,
    fail_on_batch: Option<usize>,
    writes: usize,
}

impl<R> MemorySink<R> {
    pub(crate) fn new() -> (Self, CommittedBatches<R>) {
        Self::build(None)
    }

    /// Fails the nth write (1-based) with a database error.
    pub(crate) fn failing_on_batch(n: usize) -> (Self, CommittedBatches<R>) {
        Self::build(Some(n))
    }

    fn build(fail_on_batch: Option<usize>) -> (Self, CommittedBatches<R>) {
        let batches: CommittedBatches<R> = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                batches: Arc::clone(&batches),
                fail_on_batch,
                writes: 0,
            },
            batches,
        )
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> BatchSink<R> for MemorySink<R> {
    async fn write(&mut self, batch: &[R]) -> Result<()> {
        self.writes += 1;
        if self.fail_on_batch == Some(self.writes) {
            return Err(JobError::Database(sqlx::Error::PoolClosed));
        }

        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}
