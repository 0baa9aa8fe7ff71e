//! In-memory storage, mainly for tests

use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, MutexGuard};

use super::KvStore;

/// A `KvStore` that keeps everything in a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<bool> {
        Ok(self.entries().remove(key).is_some())
    }

    fn list_keys(&self) -> io::Result<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }

    fn size_of(&self, key: &str) -> io::Result<Option<u64>> {
        Ok(self.entries().get(key).map(|v| v.len() as u64))
    }
}
