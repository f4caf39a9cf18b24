//! Local token counting from a serialized tokenizer artifact.
//!
//! The local backend loads a tokenizer definition from disk and counts tokens
//! by encoding the text. A load failure is classified as artifact
//! unavailability with the loader error as its cause, so callers can tell
//! "we never found a file" apart from "we found a file but it is unusable".

use std::path::Path;

use crate::artifact::ResolvedArtifact;
use crate::dispatch::CountResult;
use crate::error::{Cause, CountError, Result};

/// A loaded tokenizer that can encode text into token ids.
pub trait TokenizerHandle {
    /// Encode `text` into a sequence of token identifiers.
    fn encode(&self, text: &str) -> std::result::Result<Vec<u32>, Cause>;
}

/// Local tokenizer capability: load an artifact into an encodable handle.
pub trait TokenizerBackend: Send + Sync {
    /// Handle type produced by a successful load.
    type Handle: TokenizerHandle;

    /// Load a tokenizer definition from `path`.
    fn load(&self, path: &Path) -> std::result::Result<Self::Handle, Cause>;
}

/// HuggingFace `tokenizers` backend for `tokenizer.json` artifacts.
pub struct HfTokenizerBackend;

/// Handle wrapping a deserialized HuggingFace tokenizer.
pub struct HfTokenizerHandle(tokenizers::Tokenizer);

impl TokenizerBackend for HfTokenizerBackend {
    type Handle = HfTokenizerHandle;

    fn load(&self, path: &Path) -> std::result::Result<Self::Handle, Cause> {
        let tokenizer = tokenizers::Tokenizer::from_file(path)?;
        Ok(HfTokenizerHandle(tokenizer))
    }
}

impl TokenizerHandle for HfTokenizerHandle {
    fn encode(&self, text: &str) -> std::result::Result<Vec<u32>, Cause> {
        let encoding = self.0.encode(text, false)?;
        Ok(encoding.get_ids().to_vec())
    }
}

/// Local counting backend over any [`TokenizerBackend`].
pub struct LocalCounter<'a, B: TokenizerBackend> {
    backend: &'a B,
}

impl<'a, B: TokenizerBackend> LocalCounter<'a, B> {
    /// Wrap a tokenizer capability.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Count the tokens `text` occupies under the resolved artifact.
    pub fn count(&self, text: &str, artifact: &ResolvedArtifact) -> Result<CountResult> {
        let handle = self.backend.load(&artifact.path).map_err(|e| {
            CountError::artifact_with(
                format!("tokenizer artifact {} could not be loaded", artifact.path.display()),
                e,
            )
        })?;

        let ids = handle
            .encode(text)
            .map_err(|e| CountError::Unknown(format!("tokenizer encode failed: {e}")))?;

        Ok(CountResult {
            tokens: ids.len() as u64,
        })
    }
}
