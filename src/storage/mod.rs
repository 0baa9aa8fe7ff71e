//! Key-value storage media
//!
//! Both the response cache and the user data store are written against the
//! `KvStore` trait, so the same logic runs on a directory of JSON files in
//! production and on an in-memory map in unit tests.

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use std::io;

/// A flat namespace of byte values addressed by string keys
///
/// Keys are expected to be filesystem-safe (hex digests or fixed record
/// names). Absence is reported as `Ok(None)` / `Ok(false)`, never as an error.
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key`
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &[u8]) -> io::Result<()>;

    /// Removes `key`, returning whether anything was deleted
    fn delete(&self, key: &str) -> io::Result<bool>;

    /// Lists every key currently stored
    fn list_keys(&self) -> io::Result<Vec<String>>;

    /// Returns the stored size of `key` in bytes
    fn size_of(&self, key: &str) -> io::Result<Option<u64>>;
}
