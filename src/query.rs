//! Trait for the monitoring query client.
//!
//! The importer never queries the source directly; range chunker
//! implementations use this trait to evaluate the configured query over
//! each chunk and hand the raw result to the chunk-queried callback.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::QuerySourceError;
use crate::types::{SampleSeries, TimeRange};

/// Trait for clients that evaluate a range query against a monitoring
/// source, returning a set of labeled sample series.
#[async_trait]
pub trait RangeQueryClient: Send + Sync {
    /// Evaluate `query` over `range.start..range.end` at `range.step`
    /// resolution.
    ///
    /// Implementations should observe `cancel` and return promptly with
    /// an error when it fires.
    async fn query_range(
        &self,
        cancel: &CancellationToken,
        query: &str,
        range: &TimeRange,
    ) -> Result<Vec<SampleSeries>, QuerySourceError>;
}
