//! Error types for idbkv handles.

use idbkv_core::CoreError;
use idbkv_store::StoreError;
use thiserror::Error;

/// Errors that can occur during database and store operations.
///
/// Engine failures are passed through untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Engine error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid key, range or schema.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl Error {
    /// The engine error, if this is one.
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            Error::Store(e) => Some(e),
            Error::Core(_) => None,
        }
    }
}

/// Result type for idbkv operations.
pub type Result<T> = std::result::Result<T, Error>;
