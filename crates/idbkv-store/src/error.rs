//! Error types for the store module.

use idbkv_core::CoreError;
use thiserror::Error;

/// Errors reported by a host engine.
///
/// Host failures are passed through: the host's error name and message are
/// kept as-is in [`StoreError::Host`], and the well-known host conditions
/// (version, blocked, not found, closed) get their own variants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The host object-store engine is not available in this context.
    #[error("object-store engine is not available in this context")]
    Unavailable,

    /// The requested version is lower than the stored one.
    #[error("version error: requested version {requested} is less than existing version {current}")]
    VersionError { requested: u32, current: u32 },

    /// Another open connection prevents the upgrade or deletion.
    #[error("database {name} is blocked by other open connections")]
    Blocked { name: String },

    /// The store is not part of the opened database.
    #[error("object store not found: {store}")]
    NotFound { store: String },

    /// The connection was closed or the transaction is no longer usable.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Any other host error, verbatim.
    #[error("{name}: {message}")]
    Host { name: String, message: String },

    /// A value could not be converted to or from the host representation.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Invalid key, range or schema.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
