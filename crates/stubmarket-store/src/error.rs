//! Errors raised while reading or writing client state.

use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure of a [`Storage`](crate::Storage) backend or a stored value.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `RocksDB` backend failed.
    #[error("state database: {0}")]
    Database(String),

    /// A stored value is not valid UTF-8.
    #[error("value under {key} is not valid UTF-8")]
    Encoding {
        /// The storage key holding the bad value.
        key: &'static str,
    },

    /// A stored value could not be parsed or encoded.
    #[error("malformed stored value: {0}")]
    Serialization(String),
}
