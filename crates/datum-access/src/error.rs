//! Access control error types.

use std::path::PathBuf;

/// Errors from pattern parsing, policy loading and enforcement.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The policy does not allow the request
    #[error("access denied")]
    AccessDenied,

    /// A resource or action string is not a valid pattern
    #[error("invalid pattern {0:?}")]
    InvalidPattern(String),

    /// A rule in a policy document failed validation.
    ///
    /// The message is part of the observable contract and is printed verbatim.
    #[error("{0}")]
    InvalidRule(String),

    /// Policy document is not valid JSON
    #[error("invalid policy document: {0}")]
    Json(#[from] serde_json::Error),

    /// Policy file could not be read
    #[error("failed to read policy file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;
