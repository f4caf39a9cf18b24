//! Backend selection and counting dispatch.
//!
//! The dispatcher is the uniform entry point: given a request and a backend
//! selection, it produces a token count or a classified error. It performs a
//! single pass with no retries; retry policy belongs to the caller.
//!
//! Preconditions are checked before any network or disk activity so that
//! configuration errors are reported without side effects: the remote backend
//! requires a credential, the local backend requires a tokenizer backend.

use std::path::PathBuf;
use std::str::FromStr;

use crate::artifact::{ArtifactFetcher, ArtifactResolver};
use crate::config::ArtifactConfig;
use crate::error::{CountError, Result};
use crate::local::{LocalCounter, TokenizerBackend};
use crate::remote::{RemoteApi, RemoteCounter};

/// Counting backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Count via the provider's remote counting API.
    Remote,
    /// Count via a local tokenizer artifact.
    Local,
}

impl Backend {
    /// Infer the backend from a model name.
    ///
    /// `claude-*` models count remotely; everything else counts locally.
    pub fn infer(model: &str) -> Self {
        if model.to_lowercase().starts_with("claude") {
            Backend::Remote
        } else {
            Backend::Local
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(Backend::Remote),
            "local" => Ok(Backend::Local),
            other => Err(format!("unknown backend: {other}. Use: remote, local")),
        }
    }
}

/// A single counting request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct CountRequest {
    /// The text to count.
    pub text: String,
    /// Requested model identifier.
    pub model: String,
    /// Optional system prompt included in the remote payload.
    pub system: Option<String>,
    /// Explicit local artifact path. When set and missing, resolution fails
    /// hard rather than falling back.
    pub artifact_path: Option<PathBuf>,
}

impl CountRequest {
    /// Request counting `text` under `model`.
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            system: None,
            artifact_path: None,
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Pin the local tokenizer artifact to an explicit path.
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }
}

/// Terminal counting outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResult {
    /// Number of tokens the text occupies.
    pub tokens: u64,
}

/// Uniform entry point over the remote and local counting backends.
///
/// Collaborator capabilities are injected at construction. `remote` and
/// `tokenizer` are optional because their absence is itself a classified
/// outcome (`MissingCredential` / `MissingDependency`), reported before any
/// external call is made.
pub struct Dispatcher<A, F, B> {
    remote: Option<A>,
    fetcher: F,
    tokenizer: Option<B>,
    artifact_config: ArtifactConfig,
}

impl<A, F, B> Dispatcher<A, F, B>
where
    A: RemoteApi,
    F: ArtifactFetcher,
    B: TokenizerBackend,
{
    /// Create a dispatcher over the given collaborators.
    pub fn new(
        remote: Option<A>,
        fetcher: F,
        tokenizer: Option<B>,
        artifact_config: ArtifactConfig,
    ) -> Self {
        Self {
            remote,
            fetcher,
            tokenizer,
            artifact_config,
        }
    }

    /// Process one request end to end.
    ///
    /// Resolver failures short-circuit before any counting attempt; partial
    /// work is never reported as partial success.
    pub async fn run(&self, request: &CountRequest, backend: Backend) -> Result<CountResult> {
        match backend {
            Backend::Remote => {
                let api = self.remote.as_ref().ok_or_else(|| {
                    CountError::MissingCredential(
                        "set ANTHROPIC_API_KEY to use the remote backend".to_string(),
                    )
                })?;
                tracing::debug!(model = %request.model, "dispatching to remote backend");
                RemoteCounter::new(api).count(request).await
            }
            Backend::Local => {
                let tokenizer = self.tokenizer.as_ref().ok_or_else(|| {
                    CountError::MissingDependency(
                        "no local tokenizer backend is available".to_string(),
                    )
                })?;
                tracing::debug!(model = %request.model, "dispatching to local backend");
                let resolver = ArtifactResolver::new(&self.artifact_config, &self.fetcher);
                let artifact = resolver.resolve(request.artifact_path.as_deref()).await?;
                LocalCounter::new(tokenizer).count(&request.text, &artifact)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{Cause, ErrorKind};
    use crate::local::TokenizerHandle;
    use crate::remote::{ApiFailure, ModelInfo};

    struct NeverApi {
        calls: AtomicUsize,
    }

    impl NeverApi {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteApi for NeverApi {
        async fn count_tokens(
            &self,
            _model: &str,
            _system: Option<&str>,
            _text: &str,
        ) -> std::result::Result<u64, ApiFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn list_models(&self) -> std::result::Result<Vec<ModelInfo>, ApiFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    struct NeverFetcher {
        calls: AtomicUsize,
    }

    impl NeverFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArtifactFetcher for NeverFetcher {
        async fn fetch(
            &self,
            _repo_id: &str,
            _file_name: &str,
            _dest_dir: &Path,
        ) -> std::result::Result<std::path::PathBuf, Cause> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("unexpected fetch".into())
        }
    }

    /// Splits on whitespace; enough to stand in for a real tokenizer.
    struct WordBackend;

    struct WordHandle;

    impl TokenizerHandle for WordHandle {
        fn encode(&self, text: &str) -> std::result::Result<Vec<u32>, Cause> {
            Ok(text.split_whitespace().map(|_| 0).collect())
        }
    }

    impl TokenizerBackend for WordBackend {
        type Handle = WordHandle;

        fn load(&self, _path: &Path) -> std::result::Result<Self::Handle, Cause> {
            Ok(WordHandle)
        }
    }

    #[test]
    fn test_backend_inference() {
        assert_eq!(Backend::infer("claude-3-5-sonnet-latest"), Backend::Remote);
        assert_eq!(Backend::infer("Claude-Opus"), Backend::Remote);
        assert_eq!(Backend::infer("llama-3-8b"), Backend::Local);
        assert_eq!(Backend::infer("mistral"), Backend::Local);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("remote".parse::<Backend>().unwrap(), Backend::Remote);
        assert_eq!("LOCAL".parse::<Backend>().unwrap(), Backend::Local);
        assert!("quantum".parse::<Backend>().is_err());
    }

    #[tokio::test]
    async fn test_remote_without_credential_makes_no_calls() {
        let fetcher = NeverFetcher::new();
        let dispatcher: Dispatcher<NeverApi, _, WordBackend> =
            Dispatcher::new(None, fetcher, Some(WordBackend), ArtifactConfig::default());

        let request = CountRequest::new("hello", "claude-3-5-sonnet-latest");
        let err = dispatcher.run(&request, Backend::Remote).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert_eq!(dispatcher.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_without_tokenizer_backend() {
        let dispatcher: Dispatcher<NeverApi, _, WordBackend> = Dispatcher::new(
            Some(NeverApi::new()),
            NeverFetcher::new(),
            None,
            ArtifactConfig::default(),
        );

        let request = CountRequest::new("hello", "llama-3-8b");
        let err = dispatcher.run(&request, Backend::Local).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
        // Precondition failure happens before resolution.
        assert_eq!(dispatcher.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_resolver_failure_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArtifactConfig {
            cache_dir: dir.path().to_path_buf(),
            ..ArtifactConfig::default()
        };
        let dispatcher: Dispatcher<NeverApi, _, _> =
            Dispatcher::new(None, NeverFetcher::new(), Some(WordBackend), config);

        let request = CountRequest::new("hello", "llama-3-8b")
            .with_artifact_path(dir.path().join("missing.json"));
        let err = dispatcher.run(&request, Backend::Local).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactUnavailable);
        // Explicit-path failure never reaches the network.
        assert_eq!(dispatcher.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("tokenizer.json");
        std::fs::write(&model, b"{}").unwrap();
        let config = ArtifactConfig {
            cache_dir: dir.path().to_path_buf(),
            ..ArtifactConfig::default()
        };
        let dispatcher: Dispatcher<NeverApi, _, _> =
            Dispatcher::new(None, NeverFetcher::new(), Some(WordBackend), config);

        let request = CountRequest::new("one two three", "llama-3-8b")
            .with_artifact_path(&model);
        let result = dispatcher.run(&request, Backend::Local).await.unwrap();
        assert_eq!(result.tokens, 3);

        // Empty text counts as zero tokens.
        let request = CountRequest::new("", "llama-3-8b").with_artifact_path(&model);
        let result = dispatcher.run(&request, Backend::Local).await.unwrap();
        assert_eq!(result.tokens, 0);
    }
}
