//! Reference persistence behind an injectable key-value abstraction.

mod disk;
pub use disk::JsonFileStore;

use dashmap::DashMap;

use crate::common::errors::StoreError;

/// Key-value persistence for published reference URLs.
///
/// Reads and writes are synchronous; a session is the only writer for its
/// key, so no cross-key coordination is required.
pub trait ReferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and short-lived embedders.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_none_for_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("pdfUrl").unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set("pdfUrl", "https://host/x.pdf").unwrap();
        assert_eq!(
            store.get("pdfUrl").unwrap(),
            Some("https://host/x.pdf".to_string())
        );
    }

    #[test]
    fn set_replaces_existing_value() {
        let store = MemoryStore::new();
        store.set("pdfUrl", "https://host/old.pdf").unwrap();
        store.set("pdfUrl", "https://host/new.pdf").unwrap();
        assert_eq!(
            store.get("pdfUrl").unwrap(),
            Some("https://host/new.pdf".to_string())
        );
    }

    #[test]
    fn remove_clears_key_and_tolerates_missing() {
        let store = MemoryStore::new();
        store.set("pdfUrl", "https://host/x.pdf").unwrap();
        store.remove("pdfUrl").unwrap();
        assert_eq!(store.get("pdfUrl").unwrap(), None);
        store.remove("pdfUrl").unwrap();
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryStore::new();
        store.set("pdfUrl", "https://host/a.pdf").unwrap();
        store.set("examPdfUrl", "https://host/b.pdf").unwrap();
        store.remove("pdfUrl").unwrap();
        assert_eq!(
            store.get("examPdfUrl").unwrap(),
            Some("https://host/b.pdf".to_string())
        );
    }
}
