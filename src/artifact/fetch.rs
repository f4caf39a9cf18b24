//! Artifact download capability.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Cause, CountError, Result};

/// Download capability for tokenizer artifacts.
///
/// Implementations must place the file atomically: a concurrent resolution
/// must never observe a partially written artifact.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Fetch `file_name` from `repo_id` into `dest_dir`, returning the final path.
    async fn fetch(
        &self,
        repo_id: &str,
        file_name: &str,
        dest_dir: &Path,
    ) -> std::result::Result<PathBuf, Cause>;
}

/// HTTP fetcher downloading artifacts from a HuggingFace-style host.
///
/// Requests `<base_url>/<repo_id>/resolve/main/<file_name>` and writes the
/// body to a temporary file in the destination directory before renaming it
/// into place, so readers only ever see complete files.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Default artifact host.
    pub const DEFAULT_BASE_URL: &'static str = "https://huggingface.co";

    /// Create a fetcher with the given download timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CountError::MissingDependency(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the artifact host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(
        &self,
        repo_id: &str,
        file_name: &str,
        dest_dir: &Path,
    ) -> std::result::Result<PathBuf, Cause> {
        let url = format!("{}/{repo_id}/resolve/main/{file_name}", self.base_url);
        tracing::debug!(url = %url, "downloading tokenizer artifact");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(format!("empty response body from {url}").into());
        }

        // Write to a sibling temp file, then rename into place.
        let mut temp = tempfile::NamedTempFile::new_in(dest_dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;

        let final_path = dest_dir.join(file_name);
        temp.persist(&final_path)?;

        tracing::info!(path = %final_path.display(), bytes = bytes.len(), "artifact downloaded");
        Ok(final_path)
    }
}
