//! Core data types shared between the importer, the range chunker
//! and the storage sink.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::ImportError;

/// A half-open `[start, end)` query window with an associated step size.
///
/// Produced by the range chunker, consumed by the transformer. The step
/// is the resolution the query was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive start of the window.
    pub start: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end: DateTime<Utc>,
    /// Query resolution step.
    pub step: Duration,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self { start, end, step }
    }

    /// Length of the window.
    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// A single (timestamp, value) pair within a sample series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One labeled series returned by a range query: a label set plus the
/// samples observed for it, in timestamp order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSeries {
    pub labels: HashMap<String, String>,
    pub samples: Vec<Sample>,
}

/// A flattened metric row ready to be appended to the analytic table.
///
/// Immutable once produced by the transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Label mapping copied from the originating series.
    pub labels: HashMap<String, String>,
    /// Sample value.
    pub amount: f64,
    /// Step size of the window the sample was queried at.
    pub step: Duration,
    /// Sample timestamp, normalized to UTC.
    pub timestamp: DateTime<Utc>,
}

/// Result of one import invocation: the time ranges actually processed,
/// in order, plus the error that stopped the batch, if any.
///
/// The ranges are kept even when an error occurred so callers can see
/// how far the batch got before it aborted.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Windows processed, in the order the chunker drove them.
    pub ranges: Vec<TimeRange>,
    /// Error that aborted the batch, if any.
    pub error: Option<ImportError>,
}

impl ImportOutcome {
    /// An outcome that failed before any range was processed.
    pub fn failed(error: ImportError) -> Self {
        Self {
            ranges: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result`, discarding partial ranges on error.
    pub fn into_result(self) -> Result<Vec<TimeRange>, ImportError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.ranges),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_range_span() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap();
        let range = TimeRange::new(start, end, Duration::minutes(5));
        assert_eq!(range.span(), Duration::hours(1));
    }

    #[test]
    fn test_outcome_into_result() {
        let ok = ImportOutcome::default();
        assert!(ok.is_ok());
        assert!(ok.into_result().unwrap().is_empty());

        let failed = ImportOutcome::failed(ImportError::Cancelled);
        assert!(!failed.is_ok());
        assert!(failed.into_result().is_err());
    }
}
