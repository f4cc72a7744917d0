//! Error types for KeywordForge.
//!
//! Library crates use [`KeywordForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The four pipeline kinds (`EmptyInput`, `EmbeddingUnavailable`,
//! `EmptySnapshot`, `EmptyBatch`) are all recoverable at the caller: the
//! failing operation persists nothing and the caller surfaces a notice.

use std::path::PathBuf;

/// Top-level error type for all KeywordForge operations.
#[derive(Debug, thiserror::Error)]
pub enum KeywordForgeError {
    /// The normalizer produced no usable keywords from the submission.
    #[error("no usable keywords in input: {message}")]
    EmptyInput { message: String },

    /// The embedding provider failed or returned a malformed response.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The synthesizer received a cluster snapshot with no groups, or no
    /// snapshot exists yet.
    #[error("no cluster groups available: {message}")]
    EmptySnapshot { message: String },

    /// The refiner received an outline batch with no records, or no batch
    /// exists yet.
    #[error("no outline records available: {message}")]
    EmptyBatch { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed record, invalid email, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KeywordForgeError>;

impl KeywordForgeError {
    /// Create an empty-input error from any displayable message.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: msg.into(),
        }
    }

    /// Create an empty-snapshot error from any displayable message.
    pub fn empty_snapshot(msg: impl Into<String>) -> Self {
        Self::EmptySnapshot {
            message: msg.into(),
        }
    }

    /// Create an empty-batch error from any displayable message.
    pub fn empty_batch(msg: impl Into<String>) -> Self {
        Self::EmptyBatch {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is one of the recoverable pipeline kinds that the
    /// caller should report as a notice rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. }
                | Self::EmbeddingUnavailable(_)
                | Self::EmptySnapshot { .. }
                | Self::EmptyBatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KeywordForgeError::empty_input("submission was blank");
        assert_eq!(
            err.to_string(),
            "no usable keywords in input: submission was blank"
        );

        let err = KeywordForgeError::EmbeddingUnavailable("HTTP 503".into());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn pipeline_kinds_are_recoverable() {
        assert!(KeywordForgeError::empty_input("x").is_recoverable());
        assert!(KeywordForgeError::EmbeddingUnavailable("x".into()).is_recoverable());
        assert!(KeywordForgeError::empty_snapshot("x").is_recoverable());
        assert!(KeywordForgeError::empty_batch("x").is_recoverable());
        assert!(!KeywordForgeError::Storage("x".into()).is_recoverable());
    }
}
