//! Flat-file record sources
//!
//! A source produces a lazy, finite, ordered sequence of records for one
//! entity type. Comment and blank lines are filtered before decoding; a
//! malformed line fails the read immediately rather than being skipped.
//! Restartable only by reopening the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{JobError, Result};
use crate::models::FromFields;

/// Column separator in the input files.
pub const FIELD_SEPARATOR: char = ',';

/// A finite, ordered stream of records for one entity type.
pub trait RecordSource {
    type Record;

    /// Returns the next record in file order, or `None` once the stream is
    /// exhausted. Errors are not retried.
    fn next_record(&mut self) -> Result<Option<Self::Record>>;
}

/// Reads one entity type from a delimited text file, decoding each line by
/// position via [`FromFields`].
pub struct FlatFileSource<R> {
    path: PathBuf,
    reader: BufReader<File>,
    comment_marker: String,
    line_no: u64,
    _record: PhantomData<R>,
}

impl<R: FromFields> FlatFileSource<R> {
    /// Open the file for reading. Lines starting with `comment_marker` are
    /// skipped without being decoded.
    pub fn open(path: impl AsRef<Path>, comment_marker: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|err| {
            std::io::Error::new(err.kind(), format!("{}: {err}", path.display()))
        })?;

        Ok(Self {
            path,
            reader: BufReader::new(file),
            comment_marker: comment_marker.to_string(),
            line_no: 0,
            _record: PhantomData,
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: FromFields> RecordSource for FlatFileSource<R> {
    type Record = R;

    fn next_record(&mut self) -> Result<Option<R>> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.starts_with(&self.comment_marker) {
                continue;
            }

            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            return match R::from_fields(&fields) {
                Ok(record) => Ok(Some(record)),
                Err(message) => Err(JobError::Parse {
                    file: self.path.clone(),
                    line: self.line_no,
                    message,
                }),
            };
        }
    }
}
