//! In-memory session storage.
//!
//! Suitable for development, testing, and single-instance deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::store::Store;
use crate::SessionError;

/// In-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what the manager wrote.
///
/// # Note
///
/// Entries are lost when the process restarts and are never evicted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts an entry, returning its value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the lock is poisoned.
    pub fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
        Ok(self
            .entries
            .write()
            .map_err(|_| SessionError::Store("Lock poisoned".to_owned()))?
            .remove(key))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), SessionError> {
        self.entries
            .write()
            .map_err(|_| SessionError::Store("Lock poisoned".to_owned()))?
            .insert(key.to_owned(), value);

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SessionError::Store("Lock poisoned".to_owned()))?;

        Ok(entries.get(key).cloned())
    }
}
