use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::RwLock;

/// A simple record store for encoded session data.
///
/// Records are addressed by name and hold raw bytes; encoding is handled by
/// the persist layer. All methods take `&self` to support stores with
/// internal locking (e.g., RocksDB).
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Retrieves the bytes stored under `name`, or None if not present.
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores bytes under `name`, replacing any previous record.
    fn put(&self, name: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Removes the record. Removing a missing record is not an error.
    fn delete(&self, name: &str) -> Result<(), Self::Error>;
}

impl<T: Store + ?Sized> Store for &T {
    type Error = T::Error;

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).get(name)
    }

    fn put(&self, name: &str, value: &[u8]) -> Result<(), Self::Error> {
        (**self).put(name, value)
    }

    fn delete(&self, name: &str) -> Result<(), Self::Error> {
        (**self).delete(name)
    }
}

/// An in-memory store backed by a HashMap.
///
/// Useful for testing and as a reference implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.data.read().unwrap().get(name).cloned())
    }

    fn put(&self, name: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.data
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), Self::Error> {
        self.data.write().unwrap().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_put_get() {
        let store = MemoryStore::new();
        store.put("snapshot", b"hello world").unwrap();
        assert_eq!(store.get("snapshot").unwrap(), Some(b"hello world".to_vec()));
    }

    #[test]
    fn memory_store_get_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn memory_store_overwrite_and_delete() {
        let store = MemoryStore::new();
        store.put("history", b"first").unwrap();
        store.put("history", b"second").unwrap();
        assert_eq!(store.get("history").unwrap(), Some(b"second".to_vec()));

        store.delete("history").unwrap();
        store.delete("history").unwrap();
        assert_eq!(store.get("history").unwrap(), None);
    }
}
