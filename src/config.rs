//! Importer configuration.
//!
//! The configuration is caller-supplied; `from_file` additionally loads
//! it from YAML for deployments that drive the importer from a config
//! file. Durations are expressed as whole seconds in the serialized
//! form, with accessor methods returning `chrono::Duration`.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::error::{
    ConfigError, EmptyQuerySnafu, EmptyTableNameSnafu, ReadFileSnafu, YamlParseSnafu,
    ZeroChunkSizeSnafu, ZeroStepSizeSnafu,
};

/// System-wide cap on how much catch-up a single invocation performs.
///
/// Spans longer than this are split across invocations, never processed
/// in one call, regardless of the configured chunk size.
pub fn max_chunk_duration() -> Duration {
    Duration::hours(24)
}

/// Configuration for a [`MetricImporter`](crate::importer::MetricImporter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Query expression evaluated against the monitoring source.
    pub query: String,

    /// Target analytic table the records are appended to.
    pub table_name: String,

    /// Width of one query chunk in seconds (default: 300).
    #[serde(default = "default_chunk_size_secs")]
    pub chunk_size_secs: u64,

    /// Query resolution step in seconds (default: 60).
    #[serde(default = "default_step_size_secs")]
    pub step_size_secs: u64,

    /// Maximum number of chunks a single invocation processes
    /// (default: unlimited).
    #[serde(default)]
    pub max_chunks: Option<usize>,

    /// Cap on `end - start` for a single batch, in seconds, bounding
    /// result-set size (default: unlimited).
    #[serde(default)]
    pub max_query_range_secs: Option<u64>,

    /// Interval between polls when driven by the import loop
    /// (default: 300).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_chunk_size_secs() -> u64 {
    300
}

fn default_step_size_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    300
}

impl ImporterConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).context(ReadFileSnafu)?;
        let config: ImporterConfig = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Structural checks only; whether the
    /// durations make sense for the source is the caller's concern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.query.is_empty(), EmptyQuerySnafu);
        ensure!(!self.table_name.is_empty(), EmptyTableNameSnafu);
        ensure!(self.chunk_size_secs > 0, ZeroChunkSizeSnafu);
        ensure!(self.step_size_secs > 0, ZeroStepSizeSnafu);
        Ok(())
    }

    pub fn chunk_size(&self) -> Duration {
        Duration::seconds(self.chunk_size_secs as i64)
    }

    pub fn step_size(&self) -> Duration {
        Duration::seconds(self.step_size_secs as i64)
    }

    pub fn max_query_range(&self) -> Option<Duration> {
        self.max_query_range_secs
            .map(|secs| Duration::seconds(secs as i64))
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ImporterConfig {
        ImporterConfig {
            query: "sum(rate(container_cpu_usage_seconds_total[5m])) by (namespace)".to_string(),
            table_name: "datasource_node_cpu".to_string(),
            chunk_size_secs: 300,
            step_size_secs: 60,
            max_chunks: None,
            max_query_range_secs: None,
            poll_interval_secs: 300,
        }
    }

    #[test]
    fn test_duration_accessors() {
        let config = base_config();
        assert_eq!(config.chunk_size(), Duration::minutes(5));
        assert_eq!(config.step_size(), Duration::minutes(1));
        assert_eq!(config.max_query_range(), None);
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut config = base_config();
        config.query.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyQuery)));

        let mut config = base_config();
        config.table_name.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTableName)
        ));

        let mut config = base_config();
        config.chunk_size_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroChunkSize)));

        let mut config = base_config();
        config.step_size_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroStepSize)));
    }

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
query: "sum(kube_pod_container_resource_requests) by (pod)"
table_name: "datasource_pod_requests"
chunk_size_secs: 3600
step_size_secs: 300
max_chunks: 10
"#;
        let config: ImporterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.chunk_size(), Duration::hours(1));
        assert_eq!(config.step_size(), Duration::minutes(5));
        assert_eq!(config.max_chunks, Some(10));
        // Unset fields fall back to defaults
        assert_eq!(config.max_query_range_secs, None);
        assert_eq!(config.poll_interval_secs, 300);
    }

    #[test]
    fn test_max_chunk_duration_is_one_day() {
        assert_eq!(max_chunk_duration(), Duration::hours(24));
    }
}
