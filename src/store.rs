//! Trait for the storage sink.
//!
//! The sink executes appends against the analytic table and can report
//! the maximum timestamp currently stored, which the importer uses to
//! re-derive its resume point after a failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::types::MetricRecord;

/// Trait for sinks that append metric records to an analytic table.
///
/// Appends carry no dedup guarantee. Because the importer invalidates
/// its checkpoint on any mid-batch failure and replays from the sink's
/// maximum stored timestamp, implementations must tolerate duplicate
/// writes for the same span (idempotence or acceptable duplication) for
/// end-to-end correctness to hold.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Append the given records to `table`.
    ///
    /// Implementations should observe `cancel` and return promptly with
    /// an error when it fires.
    async fn store_metrics(
        &self,
        cancel: &CancellationToken,
        table: &str,
        records: &[MetricRecord],
    ) -> Result<(), StoreError>;

    /// Maximum timestamp currently stored in `table`, or `None` when
    /// the table holds no data yet.
    async fn latest_timestamp(
        &self,
        cancel: &CancellationToken,
        table: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}
