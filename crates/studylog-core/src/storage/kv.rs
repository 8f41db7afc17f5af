//! String-keyed blob store abstraction.

use std::collections::HashMap;

use crate::error::Result;

/// A string-keyed store of serialized blobs.
///
/// Implemented by the SQLite [`Database`](super::Database) and by
/// [`MemoryStore`] for tests and throwaway sessions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Write several entries at once. Either all of them land or none do.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("books").unwrap().is_none());
        store.set("books", "{}").unwrap();
        assert_eq!(store.get("books").unwrap().as_deref(), Some("{}"));
        store.remove("books").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_set_many() {
        let mut store = MemoryStore::new();
        store
            .set_many(&[("books", "{}".to_string()), ("bookOrder", "[]".to_string())])
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("bookOrder").unwrap().as_deref(), Some("[]"));
    }
}
