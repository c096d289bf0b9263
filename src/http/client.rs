//! JSON-over-HTTP client for a hosted model endpoint.
//!
//! # Responsibilities
//! - POST an opaque JSON body to one configured URL
//! - Map transport failures and HTTP statuses onto `RemoteError`
//!
//! # Design Decisions
//! - One attempt per call; retry and circuit breaking are layered on top
//! - Error bodies are truncated before they end up in logs

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::resilience::RemoteError;

/// Longest error body kept in a `RemoteError::Status` message.
const MAX_ERROR_BODY: usize = 512;

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else if e.is_builder() {
            RemoteError::Validation(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::from_status(status.as_u16(), e.to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

/// Thin wrapper over `reqwest::Client` bound to a single endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    url: Url,
}

impl RemoteClient {
    /// Build a client for `url` with an optional whole-request timeout.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let url = Url::parse(url)
            .map_err(|e| RemoteError::Validation(format!("invalid endpoint URL '{}': {}", url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, url })
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send `body` and decode the JSON response.
    pub async fn post_json(&self, body: &Value) -> Result<Value, RemoteError> {
        if body.is_null() {
            return Err(RemoteError::Validation("request body is empty".to_string()));
        }

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                    String::new()
                }
            };
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            tracing::debug!(url = %self.url, status = %status, "Remote returned error status");
            return Err(RemoteError::from_status(status.as_u16(), text));
        }

        Ok(response.json::<Value>().await?)
    }
}
