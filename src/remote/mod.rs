//! Remote token counting via a provider API.
//!
//! [`RemoteCounter`] wraps any [`RemoteApi`] capability and turns its failure
//! classes into classified [`CountError`]s. On a not-found failure it attempts
//! discovery: a best-effort model-listing call whose results enrich the error
//! with suggested alternatives. Discovery failures are swallowed; they never
//! replace the original classification.

mod anthropic;

pub use anthropic::AnthropicClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::dispatch::{CountRequest, CountResult};
use crate::error::{Cause, CountError, Result};

/// Maximum number of model suggestions attached to a not-found error.
const MAX_SUGGESTIONS: usize = 10;

/// Prefix identifying the provider's own token-generating model family.
const MODEL_FAMILY_PREFIX: &str = "claude";

/// A model identifier known to the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    /// Provider-assigned model id.
    pub id: String,
}

/// Failure classes surfaced by a remote counting API.
#[derive(Debug)]
pub enum ApiFailure {
    /// The provider does not recognize the requested model id.
    NotFound(String),
    /// Provider/API-level failure: authentication, rate limit, malformed request.
    Api {
        /// HTTP status, when the failure carried one.
        status: Option<u16>,
        /// Provider-supplied failure description.
        message: String,
        /// Underlying HTTP error, when one exists.
        source: Option<Cause>,
    },
    /// Anything else.
    Other(Cause),
}

/// Remote counting capability: count tokens and list known models.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Count the input tokens `text` (and `system`, if present) occupy under `model`.
    async fn count_tokens(
        &self,
        model: &str,
        system: Option<&str>,
        text: &str,
    ) -> std::result::Result<u64, ApiFailure>;

    /// List model identifiers known to the provider.
    async fn list_models(&self) -> std::result::Result<Vec<ModelInfo>, ApiFailure>;
}

/// Remote counting backend over any [`RemoteApi`].
pub struct RemoteCounter<'a, A: RemoteApi> {
    api: &'a A,
}

impl<'a, A: RemoteApi> RemoteCounter<'a, A> {
    /// Wrap a remote API capability.
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Count tokens for one request.
    ///
    /// Produces exactly one [`CountResult`] or one classified error; no
    /// retries are attempted.
    pub async fn count(&self, request: &CountRequest) -> Result<CountResult> {
        let outcome = self
            .api
            .count_tokens(&request.model, request.system.as_deref(), &request.text)
            .await;

        match outcome {
            Ok(tokens) => Ok(CountResult { tokens }),
            Err(ApiFailure::NotFound(message)) => {
                tracing::debug!(model = %request.model, %message, "model rejected, discovering alternatives");
                let suggestions = self.discover_alternatives().await;
                Err(CountError::ModelNotFound {
                    model: request.model.clone(),
                    suggestions,
                })
            }
            Err(ApiFailure::Api {
                status,
                message,
                source,
            }) => {
                let message = match status {
                    Some(status) => format!("API error (HTTP {status}): {message}"),
                    None => format!("API error: {message}"),
                };
                Err(CountError::Transport { message, source })
            }
            Err(ApiFailure::Other(cause)) => Err(CountError::Unknown(cause.to_string())),
        }
    }

    /// Best-effort discovery of valid model identifiers.
    ///
    /// Filters to the provider's own model family, sorts lexicographically,
    /// and caps the list. Any failure collapses to an empty list.
    async fn discover_alternatives(&self) -> Vec<String> {
        let models = match self.api.list_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::debug!(error = ?e, "model discovery failed");
                return Vec::new();
            }
        };

        let mut ids: Vec<String> = models
            .into_iter()
            .map(|m| m.id)
            .filter(|id| id.starts_with(MODEL_FAMILY_PREFIX))
            .collect();
        ids.sort();
        ids.truncate(MAX_SUGGESTIONS);
        ids
    }
}
