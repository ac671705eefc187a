//! Column families of the state database.

/// Column family names.
pub mod cf {
    /// Client state, keyed by the local-storage key name.
    pub const LOCAL_STORAGE: &str = "local_storage";
}

/// Every column family, created when the database is opened.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::LOCAL_STORAGE]
}
