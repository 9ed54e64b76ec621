//! Error types for the migration job

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

/// Error types for the migration job.
///
/// Validation is deliberately absent: a person failing validation is a
/// classification outcome routed to the invalid-people file, never an error.
#[derive(Debug, Error)]
pub enum JobError {
    /// A malformed line or field in a source file. Fatal to the owning
    /// pipeline; malformed input is never skipped.
    #[error("parse error in {} line {line}: {message}", file.display())]
    Parse {
        file: PathBuf,
        line: u64,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// A pipeline task died without reporting a result (panic or runtime
    /// shutdown).
    #[error("pipeline task aborted: {0}")]
    Aborted(String),

    /// Wraps the underlying cause with enough context to diagnose a failed
    /// run without re-running: the entity type and the chunk being processed.
    #[error("{entity} pipeline failed in chunk {chunk}: {source}")]
    Pipeline {
        entity: &'static str,
        chunk: u64,
        #[source]
        source: Box<JobError>,
    },
}

impl JobError {
    /// Attach pipeline context (entity type, chunk index) to an error.
    pub fn in_pipeline(self, entity: &'static str, chunk: u64) -> JobError {
        JobError::Pipeline {
            entity,
            chunk,
            source: Box::new(self),
        }
    }
}
