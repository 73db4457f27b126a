//! In-memory key-value store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::{KVError, KVResult, KVStore};

/// An in-memory key-value store backed by an ordered map.
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let data = self.data.read().map_err(KVError::storage)?;
        Ok(data.get(key).cloned())
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let data = self.data.read().map_err(KVError::storage)?;
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        let mut data = self.data.write().map_err(KVError::storage)?;
        for (key, value) in entries {
            data.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_overwrite() {
        let store = MemoryStore::new();
        store.set("org:a:person:1", b"p1").unwrap();
        assert_eq!(store.get("org:a:person:1").unwrap(), Some(b"p1".to_vec()));
        assert_eq!(store.get("org:a:person:2").unwrap(), None);

        store.set("org:a:person:1", b"p1v2").unwrap();
        assert_eq!(store.get("org:a:person:1").unwrap(), Some(b"p1v2".to_vec()));
    }

    #[test]
    fn scan_is_prefix_scoped_and_sorted() {
        let store = MemoryStore::new();
        store.set("org:a:person:2", b"2").unwrap();
        store.set("org:a:person:1", b"1").unwrap();
        store.set("org:ab:person:3", b"3").unwrap();
        store.set("org:b:person:4", b"4").unwrap();

        let keys: Vec<String> = store
            .scan("org:a:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["org:a:person:1", "org:a:person:2"]);
    }

    #[test]
    fn batch_set_writes_every_entry() {
        let store = MemoryStore::new();
        store.set("k1", b"old").unwrap();
        store
            .batch_set(&[
                ("k1", &b"new"[..]),
                ("k2", &b"v2"[..]),
                ("k3", &b"v3"[..]),
            ])
            .unwrap();

        assert_eq!(store.get("k1").unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.get("k2").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.get("k3").unwrap(), Some(b"v3".to_vec()));
    }

    #[test]
    fn clones_share_data() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("shared", b"x").unwrap();
        assert_eq!(b.get("shared").unwrap(), Some(b"x".to_vec()));
    }
}
