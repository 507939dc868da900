//! Cache store capability and in-memory backend

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// A key/value byte store backing the response cache
///
/// Implementations handle their own synchronization and durability. The
/// cache only relies on a `get` after a `set` of the same key observing the
/// stored value.
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, if any
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores a value, replacing any previous one
    fn set(&self, key: &str, value: &[u8]);

    /// Removes a value; missing keys are ignored
    fn delete(&self, key: &str);

    /// Short backend name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Process-local store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &[u8]) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
    }

    fn delete(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
