//! Anthropic Messages API client.
//!
//! Talks to two endpoints:
//! - `POST /v1/messages/count_tokens` for counting
//! - `GET /v1/models` for discovery
//!
//! The error body's `error.type` field gives a richer classification than the
//! HTTP status when present; when the body cannot be parsed, classification
//! degrades to the status code alone.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{CountError, Result};
use crate::remote::{ApiFailure, ModelInfo, RemoteApi};

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AnthropicClient {
    /// Default API host.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Create a client for the given credential and request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CountError::MissingDependency(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the API host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
    }
}

#[derive(Debug, Deserialize)]
struct CountTokensResponse {
    input_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Classify a non-success response from its status and body.
fn classify_failure(status: u16, body: &str) -> ApiFailure {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            if parsed.error.kind == "not_found_error" {
                ApiFailure::NotFound(parsed.error.message)
            } else {
                ApiFailure::Api {
                    status: Some(status),
                    message: parsed.error.message,
                    source: None,
                }
            }
        }
        // Unparseable body: fall back to the status code alone.
        Err(_) if status == 404 => ApiFailure::NotFound(format!("HTTP {status}")),
        Err(_) => ApiFailure::Api {
            status: Some(status),
            message: body.trim().to_string(),
            source: None,
        },
    }
}

fn send_failure(e: reqwest::Error) -> ApiFailure {
    ApiFailure::Api {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

/// The client deadline can expire mid-read; that is a transport failure,
/// not a decode failure.
fn body_failure(e: reqwest::Error) -> ApiFailure {
    if e.is_timeout() {
        send_failure(e)
    } else {
        ApiFailure::Other(Box::new(e))
    }
}

#[async_trait]
impl RemoteApi for AnthropicClient {
    async fn count_tokens(
        &self,
        model: &str,
        system: Option<&str>,
        text: &str,
    ) -> std::result::Result<u64, ApiFailure> {
        let mut body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": text }],
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }

        let response = self
            .request(reqwest::Method::POST, "/v1/messages/count_tokens")
            .json(&body)
            .send()
            .await
            .map_err(send_failure)?;

        let status = response.status();
        if status.is_success() {
            let parsed: CountTokensResponse = response.json().await.map_err(body_failure)?;
            return Ok(parsed.input_tokens);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }

    async fn list_models(&self) -> std::result::Result<Vec<ModelInfo>, ApiFailure> {
        let response = self
            .request(reqwest::Method::GET, "/v1/models?limit=100")
            .send()
            .await
            .map_err(send_failure)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: ModelsResponse = response.json().await.map_err(body_failure)?;
        Ok(parsed.data)
    }
}
