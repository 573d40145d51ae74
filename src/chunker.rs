//! Range chunker contract and its four-phase callback protocol.
//!
//! The chunker is an external collaborator: it splits a `[start, end)`
//! span into ordered sub-windows, runs the query for each, and drives
//! the callbacks below. How the span is physically split and how query
//! results are paginated is the chunker's concern, not the importer's.
//!
//! Protocol the importer relies on:
//! 1. `batch_started` exactly once, before any chunk (also when there
//!    are zero chunks).
//! 2. Per chunk, `chunk_starting` then `chunk_queried`, in order.
//! 3. `batch_finished` exactly once, after all chunks.
//! 4. Any callback error aborts the remaining chunks immediately.
//! 5. The returned ranges are the chunks actually processed, which may
//!    be fewer than the span implies when bounded by `max_chunks` or by
//!    the incomplete-chunk policy.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::ImportError;
use crate::types::{ImportOutcome, SampleSeries, TimeRange};

/// Everything the chunker needs for one batch.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// Query expression to evaluate per chunk.
    pub query: String,
    /// Inclusive start of the overall span.
    pub start: DateTime<Utc>,
    /// Exclusive end of the overall span.
    pub end: DateTime<Utc>,
    /// Width of each chunk.
    pub chunk_size: Duration,
    /// Query resolution step.
    pub step_size: Duration,
    /// Upper bound on chunks processed this batch, if any.
    pub max_chunks: Option<usize>,
    /// Whether a trailing chunk shorter than `chunk_size` may be
    /// processed.
    pub allow_incomplete_chunks: bool,
}

/// Per-run accumulator threaded through the callback protocol.
///
/// Constructed fresh for every batch so the callbacks themselves stay
/// stateless; counters and log context live here instead of in captured
/// variables.
#[derive(Debug, Default)]
pub struct BatchRun {
    /// Running count of records written to the sink this batch.
    pub records_stored: usize,
    /// Start of the first chunk, kept for the batch summary.
    pub range_begin: Option<DateTime<Utc>>,
}

impl BatchRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear counters and context at the start of a batch.
    pub fn reset(&mut self) {
        self.records_stored = 0;
        self.range_begin = None;
    }
}

/// The four lifecycle callbacks driven by the chunker.
#[async_trait]
pub trait ChunkCallbacks: Send + Sync {
    /// Called once before any chunk, with the full list of windows the
    /// chunker intends to process (possibly empty).
    async fn batch_started(
        &self,
        run: &mut BatchRun,
        ranges: &[TimeRange],
    ) -> Result<(), ImportError>;

    /// Called before each chunk is queried.
    async fn chunk_starting(&self, run: &mut BatchRun, range: &TimeRange)
        -> Result<(), ImportError>;

    /// Called with the raw query result for a chunk. This is where the
    /// importer transforms and stores the records.
    async fn chunk_queried(
        &self,
        cancel: &CancellationToken,
        run: &mut BatchRun,
        range: &TimeRange,
        series: &[SampleSeries],
    ) -> Result<(), ImportError>;

    /// Called once after the last chunk (also when zero chunks ran).
    async fn batch_finished(
        &self,
        run: &mut BatchRun,
        ranges: &[TimeRange],
    ) -> Result<(), ImportError>;
}

/// Trait for range chunkers.
#[async_trait]
pub trait RangeChunker: Send + Sync {
    /// Split the request's span into chunks and drive the callback
    /// protocol, returning the ranges actually processed plus the error
    /// that aborted the batch, if any.
    async fn chunk(
        &self,
        cancel: &CancellationToken,
        request: ChunkRequest,
        run: &mut BatchRun,
        callbacks: &dyn ChunkCallbacks,
    ) -> ImportOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_run_reset() {
        let mut run = BatchRun::new();
        run.records_stored = 42;
        run.range_begin = Some(Utc::now());

        run.reset();
        assert_eq!(run.records_stored, 0);
        assert!(run.range_begin.is_none());
    }
}
