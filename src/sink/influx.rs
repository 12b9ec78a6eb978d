//! InfluxDB v2 publisher over the HTTP write API.

use super::{Measurement, Publisher};
use crate::config::SinkConfig;
use crate::error::{ConfigError, PublishError, Result};
use reqwest::{header, Client, StatusCode};
use tracing::debug;

/// Writes measurements to one bucket of an InfluxDB v2 server.
pub struct InfluxPublisher {
    client: Client,
    endpoint: String,
    organization: String,
    bucket: String,
    token: Option<String>,
}

impl InfluxPublisher {
    /// Build the HTTP client for `bucket` on the configured server.
    pub fn new(config: &SinkConfig, bucket: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(ConfigError::sink("bucket name must not be empty"));
        }
        if !(config.url.starts_with("http://") || config.url.starts_with("https://")) {
            return Err(ConfigError::sink(format!(
                "InfluxDB URL must start with http:// or https://: {}",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::sink(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.write_endpoint(),
            organization: config.organization.clone(),
            bucket,
            token: config.token.clone(),
        })
    }

    /// The bucket this publisher writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Map a non-success write response onto the publish error taxonomy.
pub(crate) fn classify_status(status: StatusCode, body: String) -> PublishError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if body.is_empty() => {
            PublishError::unauthorized(status.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PublishError::unauthorized(body),
        _ => PublishError::Rejected {
            status: status.as_u16(),
            body,
        },
    }
}

impl Publisher for InfluxPublisher {
    async fn publish(
        &mut self,
        measurement: &Measurement,
    ) -> std::result::Result<(), PublishError> {
        let line = measurement.to_line_protocol().ok_or_else(|| {
            PublishError::encoding(format!(
                "measurement {} has no encodable fields",
                measurement.name()
            ))
        })?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("org", self.organization.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PublishError::connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(measurement = measurement.name(), "Measurement written");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, body))
    }
}
