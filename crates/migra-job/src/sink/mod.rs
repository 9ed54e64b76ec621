//! Batch sinks
//!
//! A sink durably persists one batch of same-typed records as a single
//! all-or-nothing write. Each sink owns its destination resource exclusively
//! for the duration of its pipeline.

pub mod database;
pub mod file;

pub use database::{BankAccountDbSink, PersonDbSink};
pub use file::RejectedPersonSink;

use async_trait::async_trait;

use crate::error::Result;

/// Writes one batch of records as a single operation.
///
/// A successful return means the whole batch is committed; an error means
/// none of it is, and the owning pipeline aborts. Batches already committed
/// by earlier calls are never rolled back.
#[async_trait]
pub trait BatchSink<R>: Send {
    async fn write(&mut self, batch: &[R]) -> Result<()>;
}
