//! Upstream position service client

use tracing::{debug, warn};

use crate::{
    config::TrackingConfig,
    errors::SatTrackerError,
    models::{SatellitePosition, UpstreamPosition},
};

/// Client fetching the live position of the tracked satellite
#[derive(Clone, Debug)]
pub struct PositionClient {
    client: reqwest::Client,
    url: String,
}

impl PositionClient {
    pub fn from_config(config: &TrackingConfig) -> Result<Self, SatTrackerError> {
        PositionClientBuilder::new().url(&config.position_url).build()
    }

    /// Fetch the current position.
    ///
    /// One request is made, without retries. Transport failures and error
    /// statuses become [`SatTrackerError::UpstreamConnection`]; a body that
    /// cannot be understood becomes [`SatTrackerError::UpstreamApi`].
    pub async fn current_position(&self) -> Result<SatellitePosition, SatTrackerError> {
        debug!("Requesting position from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!("Position request failed: {}", e);
                SatTrackerError::UpstreamConnection(e.to_string())
            })?;

        let body = response.bytes().await?;
        Self::parse_position(&body)
    }

    /// Parse an upstream response body
    fn parse_position(body: &[u8]) -> Result<SatellitePosition, SatTrackerError> {
        let upstream: UpstreamPosition = serde_json::from_slice(body).map_err(|e| {
            warn!("Malformed position response: {}", e);
            SatTrackerError::UpstreamApi(e.to_string())
        })?;
        upstream.into_position()
    }
}

/// Builder for PositionClient
pub struct PositionClientBuilder {
    url: Option<String>,
    client: Option<reqwest::Client>,
}

impl PositionClientBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            client: None,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<PositionClient, SatTrackerError> {
        let url = self.url.ok_or_else(|| SatTrackerError::ConfigurationError {
            message: "Position URL is required".to_string(),
        })?;
        reqwest::Url::parse(&url).map_err(|e| SatTrackerError::ConfigurationError {
            message: format!("Invalid position URL {}: {}", url, e),
        })?;

        Ok(PositionClient {
            client: self.client.unwrap_or_default(),
            url,
        })
    }
}

impl Default for PositionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_body() {
        let body = br#"{"message":"success","iss_position":{"latitude":"51.64","longitude":"-0.12"},"timestamp":1700000000}"#;

        let position = PositionClient::parse_position(body).unwrap();

        assert_eq!(position.latitude, 51.64);
        assert_eq!(position.longitude, -0.12);
        assert_eq!(position.visible, None);
    }

    #[test]
    fn parse_body_without_marker() {
        let body = br#"{"iss_position":{"latitude":"51.64","longitude":"-0.12"},"timestamp":1700000000}"#;

        let result = PositionClient::parse_position(body);

        assert!(matches!(result, Err(SatTrackerError::UpstreamApi(_))));
    }

    #[test]
    fn parse_non_json_body() {
        let result = PositionClient::parse_position(b"<html>busy</html>");

        assert!(matches!(result, Err(SatTrackerError::UpstreamApi(_))));
    }

    #[test]
    fn builder_requires_valid_url() {
        assert!(PositionClientBuilder::new().build().is_err());
        assert!(PositionClientBuilder::new().url("not a url").build().is_err());

        let client = PositionClientBuilder::new()
            .url("http://api.open-notify.org/iss-now.json")
            .build()
            .unwrap();
        assert_eq!(client.url, "http://api.open-notify.org/iss-now.json");
    }
}
