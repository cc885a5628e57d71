use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::device::models::DeviceReading;
use crate::entity::devices;
use crate::error::{AppError, AppResult};

/// Where the poller gets the current value of a sensor from.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self, sensor: &devices::Model) -> AppResult<DeviceReading>;
}

/// HTTP pull client for sensors exposing a JSON endpoint.
pub struct DeviceClient {
    http_client: Client,
}

impl DeviceClient {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.device_request_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }

    /// Get the current reading from a device endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DeviceApi` if the request fails or returns an error status.
    pub async fn fetch_reading(&self, endpoint_url: &str) -> AppResult<DeviceReading> {
        let response = self
            .http_client
            .get(endpoint_url)
            .send()
            .await
            .map_err(|e| AppError::DeviceApi(format!("Request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::DeviceApi("Rate limited (429)".to_string()));
        }

        if !status.is_success() {
            return Err(AppError::DeviceApi(format!(
                "HTTP {status}: {}",
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::DeviceApi(format!("Failed to get response text: {e}")))?;

        parse_reading(&text)
    }
}

#[async_trait]
impl ReadingSource for DeviceClient {
    async fn fetch(&self, sensor: &devices::Model) -> AppResult<DeviceReading> {
        let Some(url) = sensor.endpoint_url.as_deref() else {
            return Err(AppError::Validation(format!(
                "Sensor '{}' has no endpoint URL",
                sensor.id
            )));
        };
        self.fetch_reading(url).await
    }
}

/// Decode a device payload.
///
/// # Errors
///
/// Returns `AppError::DeviceApi` if the body is not a valid reading.
pub fn parse_reading(body: &str) -> AppResult<DeviceReading> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body_preview = %body.chars().take(200).collect::<String>(),
            "Failed to parse device reading"
        );
        AppError::DeviceApi(format!("Failed to parse response: {e}"))
    })
}
