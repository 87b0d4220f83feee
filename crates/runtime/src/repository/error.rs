//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("snapshot repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid snapshot name '{0}'")]
    InvalidName(String),

    #[error("checksum mismatch in snapshot '{name}': expected {expected}, found {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
