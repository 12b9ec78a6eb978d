//! Cycle and sink configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings that shape every sample cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Delay between the end of one cycle and the start of the next
    pub interval_secs: u64,
    /// Value of the `location` tag on every measurement
    pub location: String,
    /// Destination bucket in the sink
    pub bucket: String,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_secs: crate::DEFAULT_DELAY_SECS,
            location: crate::DEFAULT_LOCATION.to_string(),
            bucket: crate::DEFAULT_BUCKET.to_string(),
        }
    }
}

impl CycleConfig {
    /// Create a cycle configuration, rejecting a zero interval.
    pub fn new(
        interval_secs: u64,
        location: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Result<Self> {
        Self::default()
            .with_interval_secs(interval_secs)
            .with_location(location)
            .with_bucket(bucket)
            .validated()
    }

    /// Set the delay between cycles.
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the location tag.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the destination bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Check the invariants that the builder methods do not enforce.
    pub fn validated(self) -> Result<Self> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid("DELAY must be a positive number of seconds"));
        }
        if self.location.is_empty() {
            return Err(ConfigError::invalid("TAG_LOCATION must not be empty"));
        }
        if self.bucket.is_empty() {
            return Err(ConfigError::invalid("BUCKET_NAME must not be empty"));
        }
        Ok(self)
    }

    /// The inter-cycle delay as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Connection settings for the InfluxDB sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Base URL of the InfluxDB server
    pub url: String,
    /// Organization that owns the bucket
    pub organization: String,
    /// API token; never serialized
    #[serde(skip_serializing, default)]
    pub token: Option<String>,
    /// Upper bound for a single write request
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: crate::DEFAULT_INFLUX_URL.to_string(),
            organization: crate::DEFAULT_INFLUX_ORG.to_string(),
            token: None,
            timeout_secs: crate::DEFAULT_PUBLISH_TIMEOUT_SECS,
        }
    }
}

impl SinkConfig {
    /// Create a sink configuration for the given server and organization.
    pub fn new(url: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            organization: organization.into(),
            ..Default::default()
        }
    }

    /// Set the API token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// The v2 write endpoint for `bucket`, without query parameters.
    pub fn write_endpoint(&self) -> String {
        format!("{}/api/v2/write", self.url.trim_end_matches('/'))
    }

    /// The per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_defaults() {
        let config = CycleConfig::default();
        assert_eq!(config.interval_secs, 15);
        assert_eq!(config.location, "Terasa");
        assert_eq!(config.bucket, "nuculabs");
        assert_eq!(config.interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = CycleConfig::new(0, "Terasa", "nuculabs");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_write_endpoint_trims_slash() {
        let sink = SinkConfig::new("http://localhost:8086/", "org");
        assert_eq!(sink.write_endpoint(), "http://localhost:8086/api/v2/write");
    }

    #[test]
    fn test_empty_token_is_none() {
        let sink = SinkConfig::default().with_token(Some(String::new()));
        assert!(sink.token.is_none());
    }
}
