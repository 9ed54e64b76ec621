//! File batch writer for rejected person records

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::BatchSink;
use crate::error::Result;
use crate::models::Person;

/// Appends rejected person records to the invalid-people file, one line per
/// record in batch order.
///
/// Only the identifier is emitted; the output schema is fixed for downstream
/// reconciliation, not mirrored from the input. The file is created once when
/// the sink is built, stays open across flushes, and is closed when the
/// owning pipeline drops the sink, success or failure.
pub struct RejectedPersonSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RejectedPersonSink {
    /// Create (or truncate) the target file. Each job run produces a fresh
    /// reconciliation file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|err| {
            std::io::Error::new(err.kind(), format!("{}: {err}", path.display()))
        })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BatchSink<Person> for RejectedPersonSink {
    async fn write(&mut self, batch: &[Person]) -> Result<()> {
        for person in batch {
            writeln!(self.writer, "{}", person.id)?;
        }
        self.writer.flush()?;

        debug!(
            rows = batch.len(),
            file = %self.path.display(),
            "appended rejected person batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rejected(id: i32) -> Person {
        Person {
            id,
            name: String::new(),
            email: format!("person{id}@x.com"),
            birth_date: None,
            age: 20,
        }
    }

    #[tokio::test]
    async fn test_writes_one_id_per_line_in_batch_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid_people.csv");

        let mut sink = RejectedPersonSink::create(&path).unwrap();
        sink.write(&[rejected(2), rejected(5)]).await.unwrap();
        sink.write(&[rejected(9)]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2\n5\n9\n");
    }

    #[tokio::test]
    async fn test_create_truncates_previous_run_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid_people.csv");
        std::fs::write(&path, "stale\n").unwrap();

        let mut sink = RejectedPersonSink::create(&path).unwrap();
        sink.write(&[rejected(1)]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1\n");
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid_people.csv");

        let mut sink = RejectedPersonSink::create(&path).unwrap();
        sink.write(&[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
