//! Error types for idbkv Core.

use thiserror::Error;

/// Errors raised while building keys, ranges or schemas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid key range: {0}")]
    InvalidRange(String),

    #[error("invalid schema version {0}: versions start at 1")]
    InvalidVersion(u32),

    #[error("value is not a valid key: {0}")]
    NotAKey(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
