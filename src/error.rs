//! Error types for permafrost using snafu.
//!
//! External collaborators (query client, storage sink) surface their
//! failures as boxed errors; the importer wraps them with the table and
//! span they occurred in.

use chrono::{DateTime, Utc};
use snafu::prelude::*;

/// Error type for storage sink implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for monitoring query client implementations.
pub type QuerySourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============ Import Errors ============

/// Errors that can abort an import batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ImportError {
    /// The resolver could not determine the resume point. No query or
    /// write was attempted; the checkpoint stays unknown.
    #[snafu(display("failed to look up the last stored timestamp for table {table}"))]
    CheckpointLookup { table: String, source: StoreError },

    /// A range query failed mid-batch.
    #[snafu(display("range query failed for {start} to {end}"))]
    QueryRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: QuerySourceError,
    },

    /// A storage write failed mid-batch.
    #[snafu(display("failed to store metrics into table {table} for range {start} to {end}"))]
    StoreMetrics {
        table: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: StoreError,
    },

    /// The caller's cancellation signal was observed. Treated like any
    /// other mid-batch failure: the checkpoint is invalidated.
    #[snafu(display("import cancelled"))]
    Cancelled,
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Query expression is empty.
    #[snafu(display("Query expression cannot be empty"))]
    EmptyQuery,

    /// Table name is empty.
    #[snafu(display("Table name cannot be empty"))]
    EmptyTableName,

    /// Chunk size is zero.
    #[snafu(display("Chunk size must be greater than zero"))]
    ZeroChunkSize,

    /// Step size is zero.
    #[snafu(display("Step size must be greater than zero"))]
    ZeroStepSize,

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadFile { source: std::io::Error },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },
}
