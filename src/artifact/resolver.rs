//! Tiered artifact resolution.

use std::path::{Path, PathBuf};

use crate::artifact::ArtifactFetcher;
use crate::config::ArtifactConfig;
use crate::error::{CountError, Result};

/// Priority rank at which an artifact was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    /// Path supplied explicitly on the request.
    Explicit,
    /// Override path from the environment or config file.
    EnvironmentOverride,
    /// Previously downloaded file found in the cache.
    CacheHit,
    /// Downloaded during this resolution.
    FreshDownload,
}

/// A usable local tokenizer artifact.
///
/// The path refers to a non-empty regular file at the time of resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Filesystem location of the artifact.
    pub path: PathBuf,
    /// Which tier produced it.
    pub tier: SourceTier,
}

/// Locates a usable tokenizer artifact, downloading on a cache miss.
///
/// Resolution is safe to call repeatedly; after a successful
/// [`SourceTier::FreshDownload`], the next call resolves via
/// [`SourceTier::CacheHit`].
pub struct ArtifactResolver<'a, F: ArtifactFetcher> {
    config: &'a ArtifactConfig,
    fetcher: &'a F,
}

impl<'a, F: ArtifactFetcher> ArtifactResolver<'a, F> {
    /// Create a resolver over the given config and fetch capability.
    pub fn new(config: &'a ArtifactConfig, fetcher: &'a F) -> Self {
        Self { config, fetcher }
    }

    /// Resolve an artifact, trying each tier in strict priority order.
    ///
    /// An explicit path that cannot be used is a hard error: a user-supplied
    /// path is an assertion, not a hint, and is never silently bypassed.
    pub async fn resolve(&self, explicit: Option<&Path>) -> Result<ResolvedArtifact> {
        if let Some(path) = explicit {
            if usable_file(path) {
                return Ok(ResolvedArtifact {
                    path: path.to_path_buf(),
                    tier: SourceTier::Explicit,
                });
            }
            return Err(CountError::artifact(format!(
                "provided model path {} does not exist",
                path.display()
            )));
        }

        if let Some(path) = &self.config.model_path {
            if usable_file(path) {
                return Ok(ResolvedArtifact {
                    path: path.clone(),
                    tier: SourceTier::EnvironmentOverride,
                });
            }
            tracing::warn!(
                path = %path.display(),
                "configured model path is missing, falling back"
            );
        }

        let cached = self.config.cached_file();
        if usable_file(&cached) {
            tracing::debug!(path = %cached.display(), "using cached artifact");
            return Ok(ResolvedArtifact {
                path: cached,
                tier: SourceTier::CacheHit,
            });
        }

        self.download().await
    }

    async fn download(&self) -> Result<ResolvedArtifact> {
        let namespace = self.config.namespace_dir();
        std::fs::create_dir_all(&namespace).map_err(|e| {
            CountError::artifact_with(
                format!("failed to create cache directory {}", namespace.display()),
                e,
            )
        })?;

        let path = self
            .fetcher
            .fetch(&self.config.repo_id, &self.config.file_name, &namespace)
            .await
            .map_err(|e| {
                CountError::artifact_with(
                    format!(
                        "failed to download {} from {}",
                        self.config.file_name, self.config.repo_id
                    ),
                    e,
                )
            })?;

        // The fetcher promised a complete file; verify before handing it out.
        if !usable_file(&path) {
            return Err(CountError::artifact(format!(
                "downloaded artifact {} is missing or empty",
                path.display()
            )));
        }

        Ok(ResolvedArtifact {
            path,
            tier: SourceTier::FreshDownload,
        })
    }
}

/// A path counts as usable when it is a non-empty regular file.
fn usable_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{Cause, ErrorKind};

    /// Fetcher that writes a fixed payload and counts invocations.
    struct RecordingFetcher {
        calls: AtomicUsize,
        payload: Option<&'static [u8]>,
    }

    impl RecordingFetcher {
        fn serving(payload: &'static [u8]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                payload: Some(payload),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                payload: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtifactFetcher for RecordingFetcher {
        async fn fetch(
            &self,
            _repo_id: &str,
            file_name: &str,
            dest_dir: &Path,
        ) -> std::result::Result<PathBuf, Cause> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.payload {
                Some(bytes) => {
                    let path = dest_dir.join(file_name);
                    std::fs::write(&path, bytes)?;
                    Ok(path)
                }
                None => Err("connection refused".into()),
            }
        }
    }

    fn config_in(dir: &Path) -> ArtifactConfig {
        ArtifactConfig {
            cache_dir: dir.to_path_buf(),
            ..ArtifactConfig::default()
        }
    }

    #[tokio::test]
    async fn test_explicit_path_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("custom.json");
        std::fs::write(&model, b"{}").unwrap();

        let config = config_in(dir.path());
        let fetcher = RecordingFetcher::failing();
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let artifact = resolver.resolve(Some(&model)).await.unwrap();
        assert_eq!(artifact.tier, SourceTier::Explicit);
        assert_eq!(artifact.path, model);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_path_missing_fails_hard() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = RecordingFetcher::serving(b"{}");
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let missing = dir.path().join("nope.json");
        let err = resolver.resolve(Some(&missing)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactUnavailable);
        // No fallback: neither the cache nor the network is consulted.
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_override_path_preferred_over_cache() {
        let dir = tempfile::tempdir().unwrap();
        let override_path = dir.path().join("override.json");
        std::fs::write(&override_path, b"{}").unwrap();

        let mut config = config_in(dir.path());
        config.model_path = Some(override_path.clone());

        // Populate the cache too; the override must still win.
        std::fs::create_dir_all(config.namespace_dir()).unwrap();
        std::fs::write(config.cached_file(), b"{}").unwrap();

        let fetcher = RecordingFetcher::failing();
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let artifact = resolver.resolve(None).await.unwrap();
        assert_eq!(artifact.tier, SourceTier::EnvironmentOverride);
        assert_eq!(artifact.path, override_path);
    }

    #[tokio::test]
    async fn test_missing_override_falls_through_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.model_path = Some(dir.path().join("gone.json"));

        std::fs::create_dir_all(config.namespace_dir()).unwrap();
        std::fs::write(config.cached_file(), b"{}").unwrap();

        let fetcher = RecordingFetcher::failing();
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let artifact = resolver.resolve(None).await.unwrap();
        assert_eq!(artifact.tier, SourceTier::CacheHit);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_cache_downloads_once_then_hits() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = RecordingFetcher::serving(b"{\"model\":{}}");
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let first = resolver.resolve(None).await.unwrap();
        assert_eq!(first.tier, SourceTier::FreshDownload);
        assert_eq!(fetcher.call_count(), 1);

        let second = resolver.resolve(None).await.unwrap();
        assert_eq!(second.tier, SourceTier::CacheHit);
        assert_eq!(fetcher.call_count(), 1);

        // Idempotence: both resolutions point at the same file.
        assert_eq!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_fetch_failure_reported_with_cause() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = RecordingFetcher::failing();
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let err = resolver.resolve(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactUnavailable);
        let source = std::error::Error::source(&err).expect("cause attached");
        assert!(source.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_empty_cached_file_is_not_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(config.namespace_dir()).unwrap();
        std::fs::write(config.cached_file(), b"").unwrap();

        let fetcher = RecordingFetcher::serving(b"{}");
        let resolver = ArtifactResolver::new(&config, &fetcher);

        let artifact = resolver.resolve(None).await.unwrap();
        assert_eq!(artifact.tier, SourceTier::FreshDownload);
        assert_eq!(fetcher.call_count(), 1);
    }
}
