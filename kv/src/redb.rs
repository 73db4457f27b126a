//! Redb-backed persistent key-value store.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{KVError, KVResult, KVStore};

const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// A persistent key-value store backed by a single redb table.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let db = Database::create(path).map_err(KVError::storage)?;

        // Make sure the table exists so read transactions never fail on a
        // fresh file.
        let tx = db.begin_write().map_err(KVError::storage)?;
        tx.open_table(RECORDS).map_err(KVError::storage)?;
        tx.commit().map_err(KVError::storage)?;

        Ok(Self { db })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(KVError::storage)?;
        let table = tx.open_table(RECORDS).map_err(KVError::storage)?;
        let value = table.get(key).map_err(KVError::storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let tx = self.db.begin_read().map_err(KVError::storage)?;
        let table = tx.open_table(RECORDS).map_err(KVError::storage)?;

        let mut out = Vec::new();
        for item in table.range(prefix..).map_err(KVError::storage)? {
            let (k, v) = item.map_err(KVError::storage)?;
            let key = k.value();
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_string(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        let tx = self.db.begin_write().map_err(KVError::storage)?;
        {
            let mut table = tx.open_table(RECORDS).map_err(KVError::storage)?;
            for (key, value) in entries {
                table.insert(*key, *value).map_err(KVError::storage)?;
            }
        }
        tx.commit().map_err(KVError::storage)
    }
}
