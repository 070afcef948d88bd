//! Delivery of slide sets to the display device.

use crate::slide::SlideSet;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("device answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not build http client: {0}")]
    Client(String),
}

/// Two-operation contract with the device, addressed by unit name.
#[async_trait]
pub trait DisplayClient: Send + Sync {
    async fn publish(&self, unit: &str, slides: &SlideSet) -> Result<(), DisplayError>;

    async fn delete(&self, unit: &str) -> Result<(), DisplayError>;
}

// ---------------------------------------------------------------------------
// AwtrixClient
// ---------------------------------------------------------------------------

/// HTTP client for the AWTRIX custom-app endpoint
/// (`POST http://<address>/api/custom?name=<unit>`).
pub struct AwtrixClient {
    base_url: String,
    http: reqwest::Client,
}

impl AwtrixClient {
    /// `address` is a host or `host:port`; an explicit `http://` prefix is kept.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, DisplayError> {
        let address = address.trim().trim_end_matches('/');
        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DisplayError::Client(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/custom", self.base_url)
    }

    async fn send(&self, unit: &str, request: reqwest::RequestBuilder) -> Result<(), DisplayError> {
        let url = format!("{}?name={unit}", self.endpoint());
        let response = request
            .query(&[("name", unit)])
            .send()
            .await
            .map_err(|source| DisplayError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DisplayError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DisplayClient for AwtrixClient {
    async fn publish(&self, unit: &str, slides: &SlideSet) -> Result<(), DisplayError> {
        tracing::debug!(unit, slides = slides.len(), "sending widget to display");
        let request = self.http.post(self.endpoint()).json(slides);
        self.send(unit, request).await
    }

    async fn delete(&self, unit: &str) -> Result<(), DisplayError> {
        tracing::debug!(unit, "removing widget from display");
        let request = self
            .http
            .post(self.endpoint())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("");
        self.send(unit, request).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
