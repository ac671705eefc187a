//! Persisted key/value storage for the stubmarket client.
//!
//! This crate stores the small amount of state the client keeps between runs:
//! the credential pair, the display name, and a few UI preferences. Values are
//! plain strings under well-known keys, mirroring browser local storage.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   ApiClient      │────▶│   LocalStore     │
//! │   (client crate) │     │   (typed keys)   │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  Storage (trait) │
//!                          └───┬──────────┬───┘
//!                              │          │
//!                   ┌──────────▼───┐  ┌───▼──────────┐
//!                   │ RocksStorage │  │ MemoryStorage│
//!                   └──────────────┘  └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stubmarket_store::{Credentials, LocalStore, RocksStorage};
//!
//! let storage = Arc::new(RocksStorage::open("/tmp/stubmarket-state").unwrap());
//! let store = LocalStore::new(storage);
//!
//! store
//!     .save_credentials(&Credentials::new("access", "refresh"))
//!     .unwrap();
//! assert_eq!(store.access_token().unwrap().as_deref(), Some("access"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod local;
pub mod memory;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use keys::StorageKey;
pub use local::LocalStore;
pub use memory::MemoryStorage;
pub use rocks::RocksStorage;
pub use types::{Credentials, ThemeMode};

/// The storage trait defining the raw key/value operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB` on disk, in-memory for testing).
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the value is not UTF-8.
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn remove(&self, key: StorageKey) -> Result<()>;
}
