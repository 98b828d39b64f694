//! RocksDB-backed session store for Hallplan.

use std::path::Path;

use hallplan_core::Store;
use rocksdb::{DB, Options};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("RocksDB error: {0}")]
pub struct RocksError(#[from] rocksdb::Error);

/// A persistent store backed by RocksDB.
///
/// Record names are used as keys verbatim.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Opens a RocksDB store at the given path.
    ///
    /// Creates the database if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RocksError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        log::debug!("opened session store at {}", path.display());
        Ok(Self { db })
    }
}

impl Store for RocksStore {
    type Error = RocksError;

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.db.get(name.as_bytes())?)
    }

    fn put(&self, name: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.db.put(name.as_bytes(), value)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), Self::Error> {
        self.db.delete(name.as_bytes())?;
        Ok(())
    }
}
