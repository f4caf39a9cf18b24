//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`TOKMETER_*`, `ANTHROPIC_API_KEY`)
//! - CLI arguments (applied last by the binary)
//!
//! Precedence is explicit argument > environment > file > built-in default.
//! The merged [`Config`] is constructed once at the boundary and passed down;
//! the resolver and clients read no environment themselves.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CountError, Result};

/// Default model identifier when none is requested.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Default HuggingFace repository holding the local tokenizer artifact.
pub const DEFAULT_MODEL_REPO: &str = "hf-internal-testing/llama-tokenizer";

/// Default artifact file name inside the repository.
pub const DEFAULT_MODEL_FILE: &str = "tokenizer.json";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote counting backend configuration
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local tokenizer artifact configuration
    #[serde(default)]
    pub artifact: ArtifactConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CountError::Unknown(format!("failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| CountError::Unknown(format!("failed to parse config: {e}")))
    }

    /// Apply environment variable overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var("TOKMETER_API_BASE") {
            self.remote.base_url = base;
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !key.trim().is_empty() {
                self.remote.api_key = Some(key);
            }
        }
        if let Ok(repo) = std::env::var("TOKMETER_MODEL_REPO") {
            self.artifact.repo_id = repo;
        }
        if let Ok(file) = std::env::var("TOKMETER_MODEL_FILE") {
            self.artifact.file_name = file;
        }
        if let Ok(dir) = std::env::var("TOKMETER_CACHE_DIR") {
            self.artifact.cache_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("TOKMETER_MODEL_PATH") {
            self.artifact.model_path = Some(PathBuf::from(path));
        }
    }

    /// Load from an optional file path, then apply environment overrides.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }
}

/// Remote counting backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Provider API base URL
    pub base_url: String,

    /// API key for the provider (usually from `ANTHROPIC_API_KEY`)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Local tokenizer artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Repository identifier the artifact is fetched from
    pub repo_id: String,

    /// Artifact file name within the repository
    pub file_name: String,

    /// Root cache directory for downloaded artifacts
    pub cache_dir: PathBuf,

    /// Override path to an already-present artifact (environment tier)
    pub model_path: Option<PathBuf>,

    /// Download timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            repo_id: DEFAULT_MODEL_REPO.to_string(),
            file_name: DEFAULT_MODEL_FILE.to_string(),
            cache_dir: default_cache_dir(),
            model_path: None,
            timeout_secs: 120,
        }
    }
}

impl ArtifactConfig {
    /// Cache namespace for this repository.
    ///
    /// Repository ids contain `/`, which must not create nested directories
    /// with ambiguous ownership inside the cache root.
    pub fn namespace_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "--"))
    }

    /// Full path the cached artifact lives at once downloaded.
    pub fn cached_file(&self) -> PathBuf {
        self.namespace_dir().join(&self.file_name)
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("tokmeter")
}
