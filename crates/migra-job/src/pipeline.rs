//! Chunked pipeline
//!
//! Drives one entity type from its source to its sink(s) in bounded-memory
//! batches with commit-per-batch semantics. The loop reads up to
//! `chunk_size` records, routes each to an output lane, then flushes every
//! non-empty lane's accumulator as one atomic sink write. A short read means
//! the source is exhausted and the pipeline terminates after the final
//! flush.
//!
//! Failure semantics: any read or sink error aborts the pipeline
//! immediately. Already-flushed batches stay committed; there is no
//! compensating rollback across batches, and no cross-lane transaction
//! within a chunk.

use tracing::{debug, error, info};

use crate::classify::Lane;
use crate::error::{JobError, Result};
use crate::sink::BatchSink;
use crate::source::RecordSource;

/// Counters for one pipeline run, reported at its terminal state.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub entity: &'static str,
    pub records_read: u64,
    /// Records committed through the valid (primary) lane.
    pub records_written: u64,
    /// Records committed through the invalid (rejected) lane.
    pub records_rejected: u64,
    pub chunks_flushed: u64,
}

impl PipelineReport {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            records_read: 0,
            records_written: 0,
            records_rejected: 0,
            chunks_flushed: 0,
        }
    }
}

/// Routes a chunk's records to lane sinks.
///
/// Entity types without a classifier get the single implicit lane; routing
/// is a plain two-arm conditional on the lane tag, not writer dispatch.
enum Router<R> {
    SingleLane(Box<dyn BatchSink<R> + Send>),
    Classified {
        classifier: fn(&R) -> Lane,
        valid: Box<dyn BatchSink<R> + Send>,
        invalid: Box<dyn BatchSink<R> + Send>,
    },
}

impl<R: Send + Sync> Router<R> {
    fn classify(&self, record: &R) -> Lane {
        match self {
            Router::SingleLane(_) => Lane::Valid,
            Router::Classified { classifier, .. } => classifier(record),
        }
    }

    async fn flush_valid(&mut self, batch: &[R]) -> Result<()> {
        match self {
            Router::SingleLane(sink) => sink.write(batch).await,
            Router::Classified { valid, .. } => valid.write(batch).await,
        }
    }

    async fn flush_invalid(&mut self, batch: &[R]) -> Result<()> {
        match self {
            // Unreachable through classify(), which never yields Invalid for
            // a single-lane router; the one lane takes everything.
            Router::SingleLane(sink) => sink.write(batch).await,
            Router::Classified { invalid, .. } => invalid.write(batch).await,
        }
    }
}

/// One entity type's read/route/flush loop.
pub struct ChunkedPipeline<R, S> {
    entity: &'static str,
    source: S,
    chunk_size: usize,
    router: Router<R>,
}

impl<R, S> ChunkedPipeline<R, S>
where
    R: Send + Sync,
    S: RecordSource<Record = R> + Send,
{
    /// Pipeline for an entity type without a classifier: every record flows
    /// to the one sink.
    pub fn single_lane(
        entity: &'static str,
        source: S,
        chunk_size: usize,
        sink: Box<dyn BatchSink<R> + Send>,
    ) -> Self {
        Self {
            entity,
            source,
            chunk_size,
            router: Router::SingleLane(sink),
        }
    }

    /// Pipeline whose records split across two lanes by the classifier.
    pub fn classified(
        entity: &'static str,
        source: S,
        chunk_size: usize,
        classifier: fn(&R) -> Lane,
        valid: Box<dyn BatchSink<R> + Send>,
        invalid: Box<dyn BatchSink<R> + Send>,
    ) -> Self {
        Self {
            entity,
            source,
            chunk_size,
            router: Router::Classified {
                classifier,
                valid,
                invalid,
            },
        }
    }

    /// Run the pipeline to its terminal state.
    ///
    /// Returns the run's counters on success; on failure the error carries
    /// the entity type and the chunk index of the failing cycle.
    pub async fn run(mut self) -> Result<PipelineReport> {
        let entity = self.entity;
        info!(entity, chunk_size = self.chunk_size, "pipeline started");

        match self.execute().await {
            Ok(report) => {
                info!(
                    entity,
                    read = report.records_read,
                    written = report.records_written,
                    rejected = report.records_rejected,
                    chunks = report.chunks_flushed,
                    "pipeline completed"
                );
                Ok(report)
            },
            Err(err) => {
                error!(entity, error = %err, "pipeline failed");
                Err(err)
            },
        }
    }

    async fn execute(&mut self) -> Result<PipelineReport> {
        if self.chunk_size == 0 {
            return Err(JobError::Config("chunk size must be at least 1".to_string()));
        }

        let mut report = PipelineReport::new(self.entity);
        let mut chunk: u64 = 0;

        loop {
            chunk += 1;

            let mut valid_batch: Vec<R> = Vec::new();
            let mut invalid_batch: Vec<R> = Vec::new();
            let mut read_in_chunk = 0usize;

            while read_in_chunk < self.chunk_size {
                let next = self
                    .source
                    .next_record()
                    .map_err(|e| e.in_pipeline(self.entity, chunk))?;

                match next {
                    Some(record) => {
                        read_in_chunk += 1;
                        match self.router.classify(&record) {
                            Lane::Valid => valid_batch.push(record),
                            Lane::Invalid => invalid_batch.push(record),
                        }
                    },
                    None => break,
                }
            }

            report.records_read += read_in_chunk as u64;

            // Each lane's batch is flushed as one operation, independently of
            // the other lane: a failure here does not roll back the sibling
            // lane's batch committed earlier in the same cycle.
            if !valid_batch.is_empty() {
                self.router
                    .flush_valid(&valid_batch)
                    .await
                    .map_err(|e| e.in_pipeline(self.entity, chunk))?;
                report.records_written += valid_batch.len() as u64;
            }

            if !invalid_batch.is_empty() {
                self.router
                    .flush_invalid(&invalid_batch)
                    .await
                    .map_err(|e| e.in_pipeline(self.entity, chunk))?;
                report.records_rejected += invalid_batch.len() as u64;
            }

            if read_in_chunk > 0 {
                report.chunks_flushed += 1;
                debug!(
                    entity = self.entity,
                    chunk,
                    read = read_in_chunk,
                    valid = valid_batch.len(),
                    invalid = invalid_batch.len(),
                    "chunk flushed"
                );
            }

            // A short read means the source is exhausted.
            if read_in_chunk < self.chunk_size {
                return Ok(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::models::Person;
    use crate::test_support::{person, scripted_failure, MemorySink, ScriptedSource};

    fn boxed<R: Clone + Send + Sync + 'static>(sink: MemorySink<R>) -> Box<dyn BatchSink<R> + Send> {
        Box::new(sink)
    }

    #[tokio::test]
    async fn test_single_lane_chunking() {
        let source = ScriptedSource::from_records((1..=7).map(|id| person(id, "Ana")).collect());
        let (sink, batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 3, boxed(sink));
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.records_read, 7);
        assert_eq!(report.records_written, 7);
        assert_eq!(report.records_rejected, 0);
        assert_eq!(report.chunks_flushed, 3);

        let batches = batches.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_exact_chunk_multiple_has_no_trailing_flush() {
        let source = ScriptedSource::from_records((1..=6).map(|id| person(id, "Ana")).collect());
        let (sink, batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 3, boxed(sink));
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.chunks_flushed, 2);
        assert_eq!(batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_last_partial_chunk_is_flushed() {
        // chunk_size + 1 records yield two flush cycles: one full, one of 1.
        let source = ScriptedSource::from_records((1..=4).map(|id| person(id, "Ana")).collect());
        let (sink, batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 3, boxed(sink));
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.chunks_flushed, 2);
        let sizes: Vec<usize> = batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_empty_source_succeeds_with_zero_flushes() {
        let source = ScriptedSource::from_records(Vec::<Person>::new());
        let (sink, batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 3, boxed(sink));
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.records_read, 0);
        assert_eq!(report.chunks_flushed, 0);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classified_records_split_across_lanes_in_source_order() {
        let records = vec![
            person(1, "Ana"),
            person(2, ""),
            person(3, "Bia"),
            person(4, ""),
            person(5, "Caio"),
        ];
        let source = ScriptedSource::from_records(records);
        let (valid_sink, valid_batches) = MemorySink::new();
        let (invalid_sink, invalid_batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::classified(
            "person",
            source,
            2,
            classify,
            boxed(valid_sink),
            boxed(invalid_sink),
        );
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.records_read, 5);
        assert_eq!(report.records_written, 3);
        assert_eq!(report.records_rejected, 2);

        let valid_ids: Vec<i32> = valid_batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|p| p.id)
            .collect();
        let invalid_ids: Vec<i32> = invalid_batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|p| p.id)
            .collect();

        assert_eq!(valid_ids, vec![1, 3, 5]);
        assert_eq!(invalid_ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_every_record_lands_in_exactly_one_lane() {
        // Chunking is transparent: read total equals the sum written across
        // lanes for any chunk size.
        for chunk_size in 1..=6 {
            let records: Vec<Person> = (1..=5)
                .map(|id| person(id, if id % 2 == 0 { "" } else { "Ana" }))
                .collect();
            let source = ScriptedSource::from_records(records);
            let (valid_sink, _valid) = MemorySink::new();
            let (invalid_sink, _invalid) = MemorySink::new();

            let pipeline = ChunkedPipeline::classified(
                "person",
                source,
                chunk_size,
                classify,
                boxed(valid_sink),
                boxed(invalid_sink),
            );
            let report = pipeline.run().await.unwrap();

            assert_eq!(
                report.records_read,
                report.records_written + report.records_rejected
            );
        }
    }

    #[tokio::test]
    async fn test_sink_failure_aborts_and_keeps_committed_batches() {
        let source = ScriptedSource::from_records((1..=9).map(|id| person(id, "Ana")).collect());
        let (sink, batches) = MemorySink::failing_on_batch(3);

        let pipeline = ChunkedPipeline::single_lane("person", source, 3, boxed(sink));
        let err = pipeline.run().await.unwrap_err();

        match err {
            JobError::Pipeline { entity, chunk, .. } => {
                assert_eq!(entity, "person");
                assert_eq!(chunk, 3);
            },
            other => panic!("expected pipeline error, got {other:?}"),
        }

        // Chunks 1 and 2 remain committed.
        assert_eq!(batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_error_aborts_without_reading_past_failure() {
        let source = ScriptedSource::with_failure_after(
            (1..=4).map(|id| person(id, "Ana")).collect(),
            scripted_failure(),
        );
        let (sink, batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 2, boxed(sink));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, JobError::Pipeline { chunk: 3, .. }));
        // The two full chunks before the failure are committed.
        assert_eq!(batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_a_config_error() {
        let source = ScriptedSource::from_records(vec![person(1, "Ana")]);
        let (sink, _batches) = MemorySink::new();

        let pipeline = ChunkedPipeline::single_lane("person", source, 0, boxed(sink));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, JobError::Config(_)));
    }
}
