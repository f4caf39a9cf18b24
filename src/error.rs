//! Error types for token counting.
//!
//! Every external failure is caught at the point of the external call and
//! converted into a [`CountError`] with the underlying cause retained via
//! `#[source]`. Nothing propagates past a component boundary unclassified
//! except [`CountError::Unknown`], the explicit catch-all.

use thiserror::Error;

/// Boxed source error carried across classification boundaries.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified token counting errors.
#[derive(Error, Debug)]
pub enum CountError {
    /// A required external capability could not be constructed at all.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// The capability is constructible but lacks a required secret.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// No usable local tokenizer artifact: missing, undownloadable, or corrupt.
    #[error("tokenizer artifact unavailable: {message}")]
    ArtifactUnavailable {
        /// What went wrong while locating or loading the artifact.
        message: String,
        /// Underlying I/O, network, or loader error, when one exists.
        #[source]
        source: Option<Cause>,
    },

    /// The remote provider rejected the requested model identifier.
    #[error("model not found: {model}")]
    ModelNotFound {
        /// The model identifier the provider did not recognize.
        model: String,
        /// Valid alternatives discovered from the provider. Empty when
        /// discovery itself failed; discovery failure never masks this error.
        suggestions: Vec<String>,
    },

    /// The remote call failed for a reason other than an unknown model.
    #[error("transport error: {message}")]
    Transport {
        /// Provider or network level failure description.
        message: String,
        /// Underlying HTTP error, when one exists.
        #[source]
        source: Option<Cause>,
    },

    /// Unclassified failure.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Error classification discriminant, for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`CountError::MissingDependency`].
    MissingDependency,
    /// See [`CountError::MissingCredential`].
    MissingCredential,
    /// See [`CountError::ArtifactUnavailable`].
    ArtifactUnavailable,
    /// See [`CountError::ModelNotFound`].
    ModelNotFound,
    /// See [`CountError::Transport`].
    Transport,
    /// See [`CountError::Unknown`].
    Unknown,
}

impl CountError {
    /// Artifact error without an underlying cause.
    pub fn artifact(message: impl Into<String>) -> Self {
        CountError::ArtifactUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Artifact error wrapping an underlying cause.
    pub fn artifact_with(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        CountError::ArtifactUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Transport error wrapping an underlying cause.
    pub fn transport_with(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        CountError::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CountError::MissingDependency(_) => ErrorKind::MissingDependency,
            CountError::MissingCredential(_) => ErrorKind::MissingCredential,
            CountError::ArtifactUnavailable { .. } => ErrorKind::ArtifactUnavailable,
            CountError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            CountError::Transport { .. } => ErrorKind::Transport,
            CountError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Suggested model identifiers. Non-empty only for [`CountError::ModelNotFound`].
    pub fn suggestions(&self) -> &[String] {
        match self {
            CountError::ModelNotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

/// Result type alias for counting operations.
pub type Result<T> = std::result::Result<T, CountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            CountError::MissingCredential("key".into()).kind(),
            ErrorKind::MissingCredential
        );
        assert_eq!(
            CountError::artifact("gone").kind(),
            ErrorKind::ArtifactUnavailable
        );
        assert_eq!(CountError::Unknown("?".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_suggestions_only_for_model_not_found() {
        let err = CountError::ModelNotFound {
            model: "not-a-real-model".into(),
            suggestions: vec!["claude-a".into(), "claude-b".into()],
        };
        assert_eq!(err.suggestions(), ["claude-a", "claude-b"]);

        let err = CountError::Transport {
            message: "rate limited".into(),
            source: None,
        };
        assert!(err.suggestions().is_empty());
    }

    #[test]
    fn test_source_chain_retained() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CountError::artifact_with("cannot read artifact", io);
        let source = std::error::Error::source(&err).expect("source retained");
        assert!(source.to_string().contains("no such file"));
    }
}
