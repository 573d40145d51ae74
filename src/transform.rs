//! Metric transformer.
//!
//! Pure conversion from one query result and its window into a flat
//! sequence of metric records. No filtering, no deduplication.

use crate::types::{MetricRecord, SampleSeries, TimeRange};

/// Flatten a query result into records, one per (series, sample) pair,
/// preserving series-then-sample iteration order.
///
/// Each record copies its series' label set, carries the window's step
/// size and the sample's UTC timestamp.
pub fn series_to_records(range: &TimeRange, series: &[SampleSeries]) -> Vec<MetricRecord> {
    let total: usize = series.iter().map(|s| s.samples.len()).sum();
    let mut records = Vec::with_capacity(total);

    for stream in series {
        for sample in &stream.samples {
            records.push(MetricRecord {
                labels: stream.labels.clone(),
                amount: sample.value,
                step: range.step,
                timestamp: sample.timestamp,
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn series(name: &str, timestamps: &[i64], values: &[f64]) -> SampleSeries {
        let mut labels = HashMap::new();
        labels.insert("__name__".to_string(), name.to_string());
        let samples = timestamps
            .iter()
            .zip(values)
            .map(|(&secs, &value)| Sample {
                timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
                value,
            })
            .collect();
        SampleSeries { labels, samples }
    }

    #[test]
    fn test_two_series_three_samples_each() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap(),
            Duration::minutes(5),
        );
        let input = vec![
            series("cpu_usage", &[100, 200, 300], &[1.0, 2.0, 3.0]),
            series("mem_usage", &[100, 200, 300], &[4.0, 5.0, 6.0]),
        ];

        let records = series_to_records(&range, &input);
        assert_eq!(records.len(), 6);

        // Series-then-sample order, step size carried from the range
        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        for record in &records {
            assert_eq!(record.step, Duration::minutes(5));
        }
        assert_eq!(records[0].labels["__name__"], "cpu_usage");
        assert_eq!(records[3].labels["__name__"], "mem_usage");
        assert_eq!(records[0].timestamp, Utc.timestamp_opt(100, 0).unwrap());
    }

    #[test]
    fn test_empty_result_yields_no_records() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap(),
            Duration::minutes(5),
        );
        assert!(series_to_records(&range, &[]).is_empty());

        // A series with no samples contributes nothing
        let input = vec![series("cpu_usage", &[], &[])];
        assert!(series_to_records(&range, &input).is_empty());
    }
}
