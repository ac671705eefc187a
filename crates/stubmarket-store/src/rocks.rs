//! Persistent client state in a local `RocksDB` database.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use crate::error::{Result, StoreError};
use crate::keys::StorageKey;
use crate::schema::{all_column_families, cf};
use crate::Storage;

/// [`Storage`] backed by `RocksDB`, used by the CLI to keep a session across runs.
///
/// Values are stored as their raw UTF-8 bytes, so a value reads back exactly
/// as it was written.
pub struct RocksStorage {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStorage {
    /// Open the state database at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if `RocksDB` refuses to open the path
    /// (for example when another process holds the lock).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), "Opened client state database");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }
}

impl Storage for RocksStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .get_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| String::from_utf8(data).map_err(|_| StoreError::Encoding { key: key.as_str() }))
            .transpose()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .put_cf(&cf, key.as_bytes(), value.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .delete_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
