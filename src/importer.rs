//! The importer façade and its batch runner.
//!
//! [`MetricImporter`] owns the checkpoint/resume logic: it derives the
//! next query window from prior state, bounds how much work a single
//! invocation performs, serializes concurrent invocations behind a
//! gate, and decides how failures affect the saved checkpoint. The
//! actual splitting of the window into chunks is delegated to the
//! external [`RangeChunker`]; writes go to the external [`MetricStore`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snafu::prelude::*;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::checkpoint::{ImporterState, resolve_checkpoint};
use crate::chunker::{BatchRun, ChunkCallbacks, ChunkRequest, RangeChunker};
use crate::clock::Clock;
use crate::config::{ImporterConfig, max_chunk_duration};
use crate::error::{ImportError, StoreMetricsSnafu};
use crate::store::MetricStore;
use crate::transform::series_to_records;
use crate::types::{ImportOutcome, SampleSeries, TimeRange};

/// Imports metric samples from a monitoring source into an append-only
/// analytic table, resuming from where the previous invocation stopped.
///
/// At most one import runs at a time per instance; a second concurrent
/// call blocks on the gate until the first completes, it is never
/// rejected or coalesced.
pub struct MetricImporter {
    chunker: Arc<dyn RangeChunker>,
    store: Arc<dyn MetricStore>,
    clock: Arc<dyn Clock>,
    state: ImporterState,
    /// Serializes the import lifecycle. Guards no data itself; config
    /// and checkpoint live in `state`.
    import_gate: Mutex<()>,
}

impl MetricImporter {
    pub fn new(
        chunker: Arc<dyn RangeChunker>,
        store: Arc<dyn MetricStore>,
        clock: Arc<dyn Clock>,
        config: ImporterConfig,
    ) -> Self {
        Self {
            chunker,
            store,
            clock,
            state: ImporterState::new(config),
            import_gate: Mutex::new(()),
        }
    }

    /// Replace the active configuration. Takes effect for the next
    /// import; a run already in flight keeps its snapshot.
    pub async fn update_config(&self, config: ImporterConfig) {
        self.state.update_config(config).await;
    }

    /// The last successfully imported timestamp, `None` while unknown.
    pub async fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.state.checkpoint().await
    }

    /// Import starting from the checkpoint of the previous invocation.
    ///
    /// When the checkpoint is unknown it is re-derived from the sink's
    /// maximum stored timestamp; if the sink holds no data yet, the
    /// last two chunk widths are backfilled (the most recent chunk ends
    /// at "now" and is typically incomplete, doubling reaches the chunk
    /// before it). The window is capped at 24h of catch-up per call.
    pub async fn import_from_last_timestamp(
        &self,
        cancel: &CancellationToken,
        allow_incomplete_chunks: bool,
    ) -> ImportOutcome {
        let _gate = self.import_gate.lock().await;
        let config = self.state.config().await;
        debug!("import from last timestamp started for {}", config.table_name);

        let mut end_time = self.clock.now();

        // An unknown checkpoint means either a fresh instance or an
        // earlier failed batch; ask the sink where we left off.
        let mut checkpoint = self.state.checkpoint().await;
        if checkpoint.is_none() {
            debug!(
                "last timestamp for table {} isn't known, querying the sink",
                config.table_name
            );
            match resolve_checkpoint(cancel, self.store.as_ref(), &config.table_name).await {
                Ok(resolved) => {
                    if let Some(ts) = resolved {
                        self.state.advance_checkpoint(ts).await;
                    }
                    checkpoint = resolved;
                }
                Err(err) => {
                    error!(
                        "unable to determine last timestamp for table {}: {err}",
                        config.table_name
                    );
                    return ImportOutcome::failed(err);
                }
            }
        }

        let start_time = match checkpoint {
            Some(last) => {
                debug!("last timestamp for table {}: {last}", config.table_name);
                // Start one step past the checkpoint so the boundary
                // sample is not emitted twice.
                last + config.step_size()
            }
            None => {
                debug!("no data in table {} yet", config.table_name);
                end_time - config.chunk_size() * 2
            }
        };

        // Cap catch-up distance so an instance that sat idle for a long
        // time doesn't process an unbounded span in one call.
        if end_time - start_time >= max_chunk_duration() {
            end_time = start_time + max_chunk_duration();
        }

        debug!("importing {start_time} to {end_time} for {}", config.table_name);
        let outcome = self
            .run_batch(cancel, &config, start_time, end_time, allow_incomplete_chunks)
            .await;
        debug!("import from last timestamp finished for {}", config.table_name);
        outcome
    }

    /// Import an explicit caller-supplied span. No checkpoint
    /// derivation, no backfill; checkpoint updates on outcome apply as
    /// usual.
    pub async fn import_metrics(
        &self,
        cancel: &CancellationToken,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        allow_incomplete_chunks: bool,
    ) -> ImportOutcome {
        let _gate = self.import_gate.lock().await;
        let config = self.state.config().await;
        debug!(
            "import started for {} over {start_time} to {end_time}",
            config.table_name
        );

        let outcome = self
            .run_batch(cancel, &config, start_time, end_time, allow_incomplete_chunks)
            .await;
        debug!("import finished for {}", config.table_name);
        outcome
    }

    /// Run one batch: bound the span, drive the chunker, settle the
    /// checkpoint from the outcome.
    async fn run_batch(
        &self,
        cancel: &CancellationToken,
        config: &ImporterConfig,
        start_time: DateTime<Utc>,
        mut end_time: DateTime<Utc>,
        allow_incomplete_chunks: bool,
    ) -> ImportOutcome {
        // Independent of the 24h catch-up cap: this one bounds the
        // result-set size of a single batch.
        if let Some(max_range) = config.max_query_range() {
            if end_time - start_time > max_range {
                let clamped = start_time + max_range;
                warn!(
                    "time range {start_time} to {end_time} exceeds max query range duration \
                     {max_range}, clamping end to {clamped}"
                );
                end_time = clamped;
            }
        }

        let request = ChunkRequest {
            query: config.query.clone(),
            start: start_time,
            end: end_time,
            chunk_size: config.chunk_size(),
            step_size: config.step_size(),
            max_chunks: config.max_chunks,
            allow_incomplete_chunks,
        };
        let callbacks = StoreCallbacks {
            table: &config.table_name,
            store: self.store.as_ref(),
        };
        let mut run = BatchRun::new();

        let outcome = self
            .chunker
            .chunk(cancel, request, &mut run, &callbacks)
            .await;

        match &outcome.error {
            Some(err) => {
                // It cannot be determined how much of the batch was
                // durably stored, so the next run re-derives the resume
                // point from the sink.
                error!("error collecting metrics for {}: {err}", config.table_name);
                self.state.invalidate_checkpoint().await;
            }
            None => {
                if let Some(last) = outcome.ranges.last() {
                    self.state.advance_checkpoint(last.end).await;
                }
            }
        }

        outcome
    }
}

/// Callback implementation wiring the transformer to the storage sink.
///
/// Stateless by construction: everything mutable for the current batch
/// lives in the [`BatchRun`] handed to each invocation.
struct StoreCallbacks<'a> {
    table: &'a str,
    store: &'a dyn MetricStore,
}

#[async_trait]
impl ChunkCallbacks for StoreCallbacks<'_> {
    async fn batch_started(
        &self,
        run: &mut BatchRun,
        ranges: &[TimeRange],
    ) -> Result<(), ImportError> {
        run.reset();
        match (ranges.first(), ranges.last()) {
            (Some(first), Some(last)) => {
                run.range_begin = Some(first.start);
                debug!(
                    "querying for data between {} and {} (chunks: {}) for table {}",
                    first.start,
                    last.end,
                    ranges.len(),
                    self.table
                );
            }
            _ => info!("no time ranges to query yet for table {}", self.table),
        }
        Ok(())
    }

    async fn chunk_starting(
        &self,
        _run: &mut BatchRun,
        range: &TimeRange,
    ) -> Result<(), ImportError> {
        debug!("querying range {} to {}", range.start, range.end);
        Ok(())
    }

    async fn chunk_queried(
        &self,
        cancel: &CancellationToken,
        run: &mut BatchRun,
        range: &TimeRange,
        series: &[SampleSeries],
    ) -> Result<(), ImportError> {
        let records = series_to_records(range, series);
        if records.is_empty() {
            debug!("got 0 metrics for range {} to {}", range.start, range.end);
            return Ok(());
        }

        debug!(
            "got {} metrics for range {} to {}, storing them into table {}",
            records.len(),
            range.start,
            range.end,
            self.table
        );
        self.store
            .store_metrics(cancel, self.table, &records)
            .await
            .context(StoreMetricsSnafu {
                table: self.table,
                start: range.start,
                end: range.end,
            })?;

        run.records_stored += records.len();
        Ok(())
    }

    async fn batch_finished(
        &self,
        run: &mut BatchRun,
        ranges: &[TimeRange],
    ) -> Result<(), ImportError> {
        match (ranges.first(), ranges.last()) {
            (Some(first), Some(last)) => info!(
                "stored a total of {} metrics for data between {} and {} into {}",
                run.records_stored, first.start, last.end, self.table
            ),
            _ => info!("no time ranges processed for {}", self.table),
        }
        Ok(())
    }
}
