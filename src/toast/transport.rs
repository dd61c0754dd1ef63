//! Shared HTTP plumbing for Toast calls.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ToastError;
use crate::config::ToastConfig;

/// Header Toast uses to scope a request to one restaurant.
pub const RESTAURANT_EXTERNAL_ID_HEADER: &str = "Toast-Restaurant-External-ID";

#[derive(Debug, Clone)]
pub struct ToastTransport {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl ToastTransport {
    /// Builds a client bound to the configured environment and per-call timeout.
    pub fn new(config: &ToastConfig) -> Result<Self, ToastError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("toast-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToastError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            timeout_secs: config.http_timeout_seconds,
        })
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}{}", self.base_url, path))
    }

    /// Sends the request and decodes a 2xx JSON body; anything else becomes a [`ToastError`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ToastError> {
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    debug!(status = %status, error = %error, "Failed to read Toast error body");
                    format!("<unreadable body: {}>", self.classify(error))
                }
            };
            return Err(ToastError::vendor(status, &body));
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&bytes).map_err(|e| ToastError::Decode(e.to_string()))
    }

    fn classify(&self, error: reqwest::Error) -> ToastError {
        if error.is_timeout() {
            ToastError::Timeout(self.timeout_secs)
        } else if error.is_decode() {
            ToastError::Decode(error.to_string())
        } else {
            ToastError::Network(error.to_string())
        }
    }
}
