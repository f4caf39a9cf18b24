//! Local tokenizer artifact resolution.
//!
//! The local backend needs a serialized tokenizer file on disk. This module
//! locates one through a prioritized fallback chain and downloads it into the
//! cache when absent.
//!
//! # Resolution tiers
//!
//! | Tier                | Source                                      |
//! |---------------------|---------------------------------------------|
//! | Explicit            | Path supplied on the request (hard error if missing) |
//! | EnvironmentOverride | `TOKMETER_MODEL_PATH` / config `model_path` |
//! | CacheHit            | Previously downloaded file in the cache     |
//! | FreshDownload       | Network fetch into the cache                |
//!
//! Exactly one tier is used per resolution, in that order.

mod fetch;
mod resolver;

pub use fetch::{ArtifactFetcher, HttpFetcher};
pub use resolver::{ArtifactResolver, ResolvedArtifact, SourceTier};
