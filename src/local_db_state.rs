//! LMDB-backed [`StorageBackend`].

use std::fs;
use std::path::{Path, PathBuf};

use lmdb::{Cursor, Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};

use crate::error::StorageError;
use crate::storage::StorageBackend;

/// Default LMDB map size: 10 MiB is far beyond any realistic workout history.
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

pub struct AppDbState {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl AppDbState {
    /// Opens (or creates) the environment at `<name>.lmdb`.
    pub fn init(name: &str, map_size: usize) -> Result<Self, StorageError> {
        let path = PathBuf::from(format!("{name}.lmdb"));
        fs::create_dir_all(&path)
            .map_err(|e| StorageError::with_cause(format!("Failed to create {}", path.display()), e))?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)
            .map_err(|e| StorageError::with_cause(format!("Failed to open {}", path.display()), e))?;

        let db = env
            .create_db(None, DatabaseFlags::empty())
            .map_err(|e| StorageError::with_cause("Failed to open main database", e))?;

        info!("LMDB environment ready at {}", path.display());
        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes pending writes to disk. The environment itself closes on drop.
    pub fn sync(&self) -> Result<(), StorageError> {
        self.env
            .sync(true)
            .map_err(|e| StorageError::with_cause("Failed to sync database", e))
    }
}

impl StorageBackend for AppDbState {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self
            .env
            .begin_ro_txn()
            .map_err(|e| StorageError::with_cause("Failed to get item from storage", e))?;

        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(StorageError::with_cause("Failed to get item from storage", e)),
        };
        txn.abort();

        value
            .map(String::from_utf8)
            .transpose()
            .map_err(|e| StorageError::with_cause("Failed to get item from storage", e))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut txn = self
            .env
            .begin_rw_txn()
            .map_err(|e| StorageError::with_cause("Failed to set item in storage", e))?;
        txn.put(self.db, &key, &value, WriteFlags::empty())
            .map_err(|e| StorageError::with_cause("Failed to set item in storage", e))?;
        txn.commit()
            .map_err(|e| StorageError::with_cause("Failed to set item in storage", e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut txn = self
            .env
            .begin_rw_txn()
            .map_err(|e| StorageError::with_cause("Failed to remove item from storage", e))?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(StorageError::with_cause("Failed to remove item from storage", e)),
        }
        txn.commit()
            .map_err(|e| StorageError::with_cause("Failed to remove item from storage", e))
    }

    fn clear_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let mut txn = self
            .env
            .begin_rw_txn()
            .map_err(|e| StorageError::with_cause("Failed to clear storage", e))?;

        let keys: Vec<Vec<u8>> = {
            let mut cursor = txn
                .open_ro_cursor(self.db)
                .map_err(|e| StorageError::with_cause("Failed to clear storage", e))?;
            cursor
                .iter()
                .map(|(key, _)| key)
                .filter(|key| key.starts_with(prefix.as_bytes()))
                .map(|key| key.to_vec())
                .collect()
        };

        for key in &keys {
            txn.del(self.db, key, None)
                .map_err(|e| StorageError::with_cause("Failed to clear storage", e))?;
        }
        txn.commit()
            .map_err(|e| StorageError::with_cause("Failed to clear storage", e))?;

        debug!("Removed {} keys from {}", keys.len(), self.path.display());
        Ok(keys.len())
    }
}
