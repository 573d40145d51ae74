//! Checkpoint resolution and the shared importer state.
//!
//! The checkpoint is the last successfully imported timestamp for the
//! target table, `None` while undetermined. It lives alongside the
//! active config in [`ImporterState`], a guarded holder with narrow
//! accessors; serialization of whole import runs is a separate concern
//! handled by the importer's gate.

use chrono::{DateTime, Utc};
use snafu::prelude::*;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::ImporterConfig;
use crate::error::{CheckpointLookupSnafu, ImportError};
use crate::store::MetricStore;

/// Determine the resume point for `table` by asking the sink for the
/// maximum timestamp it currently holds.
///
/// Returns `Ok(None)` when the table has no data yet. Sink failures
/// propagate as [`ImportError::CheckpointLookup`] and are not retried
/// here.
pub async fn resolve_checkpoint(
    cancel: &CancellationToken,
    store: &dyn MetricStore,
    table: &str,
) -> Result<Option<DateTime<Utc>>, ImportError> {
    store
        .latest_timestamp(cancel, table)
        .await
        .context(CheckpointLookupSnafu { table })
}

#[derive(Debug)]
struct StateInner {
    config: ImporterConfig,
    checkpoint: Option<DateTime<Utc>>,
}

/// Config and checkpoint behind a single lock.
///
/// All mutation goes through these accessors; nothing else holds the
/// lock, so each call is a short critical section.
#[derive(Debug)]
pub struct ImporterState {
    inner: Mutex<StateInner>,
}

impl ImporterState {
    /// Create state with the given config and an unknown checkpoint.
    pub fn new(config: ImporterConfig) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                config,
                checkpoint: None,
            }),
        }
    }

    /// Snapshot of the active configuration.
    pub async fn config(&self) -> ImporterConfig {
        self.inner.lock().await.config.clone()
    }

    /// Replace the active configuration. Imports already in flight keep
    /// the snapshot they took at the start of their run.
    pub async fn update_config(&self, config: ImporterConfig) {
        self.inner.lock().await.config = config;
    }

    /// Current checkpoint, `None` while unknown.
    pub async fn checkpoint(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.checkpoint
    }

    /// Record a new last-imported timestamp.
    pub async fn advance_checkpoint(&self, timestamp: DateTime<Utc>) {
        self.inner.lock().await.checkpoint = Some(timestamp);
    }

    /// Forget the checkpoint. The next import re-derives it from the
    /// sink's maximum stored timestamp.
    pub async fn invalidate_checkpoint(&self) {
        self.inner.lock().await.checkpoint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> ImporterConfig {
        ImporterConfig {
            query: "up".to_string(),
            table_name: "datasource_up".to_string(),
            chunk_size_secs: 300,
            step_size_secs: 60,
            max_chunks: None,
            max_query_range_secs: None,
            poll_interval_secs: 300,
        }
    }

    #[tokio::test]
    async fn test_checkpoint_starts_unknown() {
        let state = ImporterState::new(config());
        assert_eq!(state.checkpoint().await, None);
    }

    #[tokio::test]
    async fn test_advance_and_invalidate() {
        let state = ImporterState::new(config());
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();

        state.advance_checkpoint(ts).await;
        assert_eq!(state.checkpoint().await, Some(ts));

        state.invalidate_checkpoint().await;
        assert_eq!(state.checkpoint().await, None);
    }

    #[tokio::test]
    async fn test_update_config_swaps_snapshot() {
        let state = ImporterState::new(config());
        let mut updated = config();
        updated.chunk_size_secs = 3600;
        state.update_config(updated).await;
        assert_eq!(state.config().await.chunk_size_secs, 3600);
    }
}
