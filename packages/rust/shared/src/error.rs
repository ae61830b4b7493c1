//! Error types for listing-rewriter.
//!
//! Library crates use [`ListingError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all listing-rewriter operations.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database unreachable or a query/update failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Generation backend failed: transport, HTTP status, or empty output.
    #[error("generation error: {0}")]
    Generation(String),

    /// Generated text did not have the expected title/description shape.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ListingError>;

impl ListingError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-response error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
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
}
