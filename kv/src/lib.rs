//! Key-value persistence for footfall records.
//!
//! Records are stored under string keys with opaque byte values. Keys are
//! namespaced by the caller (for example `org:{org}:person:{id}`) so that a
//! prefix scan returns one tenant's records in ascending key order.
//!
//! Two backends are provided: [`MemoryStore`] for tests and ephemeral use,
//! and [`RedbStore`] for an on-disk database.

pub mod memory;
pub mod redb;

use std::fmt;

use thiserror::Error;

/// Errors that can occur in KV store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: storage error: {0}")]
    Storage(String),
}

impl KVError {
    pub(crate) fn storage(e: impl fmt::Display) -> Self {
        KVError::Storage(e.to_string())
    }
}

/// Result type for KV operations.
pub type KVResult<T> = Result<T, KVError>;

/// Key-value store trait.
///
/// Implementations must be safe for concurrent use. A batch passed to
/// [`KVStore::batch_set`] is written atomically: either every entry is
/// visible afterwards or none is.
pub trait KVStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Return every entry whose key starts with `prefix`, ordered by key.
    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>>;

    /// Set multiple key-value pairs atomically.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.batch_set(&[(key, value)])
    }
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

pub use memory::MemoryStore;
pub use redb::RedbStore;
