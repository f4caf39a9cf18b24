//! # tokmeter - Token Counting for LLM Payloads
//!
//! Counts how many tokens a block of text occupies under a given
//! language-model tokenizer, delegating to one of two interchangeable
//! backends:
//!
//! - **Remote**: the provider's counting API (Anthropic Messages
//!   `count_tokens`), with model-not-found recovery that discovers valid
//!   alternatives via the model-listing endpoint.
//! - **Local**: a serialized tokenizer artifact on disk, located through a
//!   tiered fallback chain and downloaded into a cache when absent.
//!
//! The counting itself is delegated; the hard part lives here: backend
//! selection, artifact resolution, and failure classification that stays
//! robust across missing dependencies, missing credentials, missing model
//! files, and unknown model names.
//!
//! ## Artifact resolution tiers
//!
//! | Tier                | Source                                        |
//! |---------------------|-----------------------------------------------|
//! | Explicit            | Path on the request; missing is a hard error  |
//! | EnvironmentOverride | `TOKMETER_MODEL_PATH` / config `model_path`   |
//! | CacheHit            | Previously downloaded file in the cache       |
//! | FreshDownload       | Network fetch, placed atomically in the cache |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokmeter::{
//!     artifact::HttpFetcher,
//!     config::Config,
//!     dispatch::{Backend, CountRequest, Dispatcher},
//!     local::HfTokenizerBackend,
//!     remote::AnthropicClient,
//! };
//! use std::time::Duration;
//!
//! let config = Config::load(None)?;
//! let remote = config
//!     .remote
//!     .api_key
//!     .as_ref()
//!     .map(|key| AnthropicClient::new(key, Duration::from_secs(60)))
//!     .transpose()?;
//! let fetcher = HttpFetcher::new(Duration::from_secs(120))?;
//!
//! let dispatcher = Dispatcher::new(remote, fetcher, Some(HfTokenizerBackend), config.artifact);
//! let request = CountRequest::new("Hello, world!", "claude-3-5-sonnet-latest");
//! let result = dispatcher.run(&request, Backend::Remote).await?;
//! println!("{}", result.tokens);
//! ```
//!
//! ## Modules
//!
//! - [`dispatch`]: backend selection and the uniform counting entry point
//! - [`artifact`]: tiered tokenizer artifact resolution and caching
//! - [`remote`]: provider counting API client and error classification
//! - [`local`]: counting via a local tokenizer artifact
//! - [`config`]: defaults, TOML files, environment overrides
//! - [`error`]: classified error types and result alias

pub mod artifact;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod local;
pub mod remote;

// Re-exports for convenience
pub use artifact::{ArtifactFetcher, ArtifactResolver, HttpFetcher, ResolvedArtifact, SourceTier};
pub use config::Config;
pub use dispatch::{Backend, CountRequest, CountResult, Dispatcher};
pub use error::{CountError, ErrorKind, Result};
pub use local::{HfTokenizerBackend, LocalCounter, TokenizerBackend};
pub use remote::{AnthropicClient, RemoteApi, RemoteCounter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
