//! permafrost: incremental import of time-series metrics into an
//! append-only analytic table, with checkpointed resume.
//!
//! Repeated invocations pick up exactly where the previous one stopped,
//! even after crashes: the importer keeps an in-memory checkpoint of
//! the last successfully imported timestamp and, whenever that is
//! unknown, re-derives it from the maximum timestamp the storage sink
//! already holds. Any mid-batch failure invalidates the checkpoint, so
//! recovery always falls back to the sink; the sink must therefore
//! tolerate replayed writes for the same span.
//!
//! The query client, the range chunker and the storage sink are
//! external collaborators plugged in through the [`query`], [`chunker`]
//! and [`store`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use permafrost::{ImporterConfig, MetricImporter, SystemClock};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ImporterConfig::from_file("importer.yaml").unwrap();
//!     let importer = MetricImporter::new(chunker, store, Arc::new(SystemClock), config);
//!     let outcome = importer
//!         .import_from_last_timestamp(&CancellationToken::new(), true)
//!         .await;
//!     println!("processed {} ranges", outcome.ranges.len());
//! }
//! ```

pub mod checkpoint;
pub mod chunker;
pub mod clock;
pub mod config;
pub mod error;
pub mod importer;
pub mod polling;
pub mod query;
pub mod store;
pub mod transform;
pub mod types;

// Re-export main types
pub use chunker::{BatchRun, ChunkCallbacks, ChunkRequest, RangeChunker};
pub use clock::{Clock, SystemClock};
pub use config::ImporterConfig;
pub use error::{ConfigError, ImportError};
pub use importer::MetricImporter;
pub use polling::run_import_loop;
pub use query::RangeQueryClient;
pub use store::MetricStore;
pub use types::{ImportOutcome, MetricRecord, Sample, SampleSeries, TimeRange};
