//! Cache manager for persisting API responses
//!
//! Provides a `ResponseCache` that stores serializable payloads as JSON documents
//! stamped with their write time. Every failure of the underlying medium is
//! logged and turned into a miss or a no-op, so callers never see cache errors.

use chrono::{DateTime, Duration, Local};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::fingerprint::{fingerprint, Params};
use crate::clock::{Clock, SystemClock};
use crate::storage::{DirStore, KvStore};

/// Default time-to-live of a cache entry, in days
pub const DEFAULT_TTL_DAYS: i64 = 2;

/// Document stored on disk for every cached response
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// When the response was written (local clock)
    timestamp: DateTime<Local>,
    /// Endpoint the response came from, kept for diagnostics
    endpoint: String,
    /// Request parameters, kept for diagnostics
    params: Params,
    /// The cached payload
    data: T,
}

/// Just the part of an entry the expiry predicate needs
#[derive(Deserialize)]
struct EntryHeader {
    timestamp: DateTime<Local>,
}

/// Aggregate numbers for the cache management screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries, readable or not
    pub count: usize,
    /// Total size of all entries in bytes
    pub total_size_bytes: u64,
    /// Entries older than the TTL that have not been evicted yet
    pub expired_count: usize,
}

impl CacheStats {
    /// Total size in megabytes, rounded to two decimals
    pub fn size_mb(&self) -> f64 {
        let mb = self.total_size_bytes as f64 / (1024.0 * 1024.0);
        (mb * 100.0).round() / 100.0
    }
}

/// TTL-expiring store of API responses keyed by request fingerprint
pub struct ResponseCache {
    store: Box<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Creates a cache over any storage medium, using the system clock
    pub fn new(store: impl KvStore + 'static, ttl: Duration) -> Self {
        Self {
            store: Box::new(store),
            clock: Arc::new(SystemClock),
            ttl,
        }
    }

    /// Creates a cache storing one `<key>.json` file per entry in `dir`
    ///
    /// Never fails: if the directory cannot be created the cache still works,
    /// it just misses on every read and drops every write.
    pub fn open_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let store = DirStore::new(dir);
        if let Err(e) = store.ensure_dir() {
            warn!(dir = %store.dir().display(), error = %e, "cache directory unavailable, caching disabled");
        }
        Self::new(store, ttl)
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, stored_at: DateTime<Local>, now: DateTime<Local>) -> bool {
        now.signed_duration_since(stored_at) > self.ttl
    }

    /// Looks up a cached response
    ///
    /// Returns `None` when the entry is missing, unreadable, or older than the
    /// TTL. An expired entry is deleted before returning.
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &Params) -> Option<T> {
        let key = fingerprint(endpoint, params);
        let bytes = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(endpoint, key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "corrupt cache entry");
                return None;
            }
        };

        if self.is_expired(entry.timestamp, self.clock.now()) {
            debug!(endpoint, key = %key, "cache entry expired, evicting");
            if let Err(e) = self.store.delete(&key) {
                warn!(key = %key, error = %e, "failed to evict expired cache entry");
            }
            return None;
        }

        debug!(endpoint, key = %key, "cache hit");
        Some(entry.data)
    }

    /// Stores a response, replacing any previous entry for the same request
    ///
    /// Returns whether the entry was written. Failures are logged, not raised.
    pub fn set<T: Serialize>(&self, endpoint: &str, params: &Params, payload: &T) -> bool {
        let key = fingerprint(endpoint, params);
        let entry = CacheEntry {
            timestamp: self.clock.now(),
            endpoint: endpoint.to_string(),
            params: params.clone(),
            data: payload,
        };

        let json = match serde_json::to_vec(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(endpoint, error = %e, "failed to encode cache entry");
                return false;
            }
        };

        match self.store.put(&key, &json) {
            Ok(()) => {
                debug!(endpoint, key = %key, "cached response");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache write failed");
                false
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.store.list_keys().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list cache entries");
            Vec::new()
        })
    }

    /// Reads an entry's timestamp, `None` if the entry is unreadable
    fn stored_at(&self, key: &str) -> Option<DateTime<Local>> {
        let bytes = match self.store.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice::<EntryHeader>(&bytes) {
            Ok(header) => Some(header.timestamp),
            Err(e) => {
                warn!(key, error = %e, "skipping corrupt cache entry");
                None
            }
        }
    }

    /// Deletes every expired entry and returns how many were removed
    ///
    /// Corrupt or unreadable entries are skipped.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let mut cleared = 0;
        for key in self.keys() {
            let Some(stored_at) = self.stored_at(&key) else {
                continue;
            };
            if !self.is_expired(stored_at, now) {
                continue;
            }
            match self.store.delete(&key) {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "failed to delete expired cache entry"),
            }
        }
        debug!(cleared, "cleared expired cache entries");
        cleared
    }

    /// Deletes every entry and returns how many were removed
    pub fn clear_all(&self) -> usize {
        let mut cleared = 0;
        for key in self.keys() {
            match self.store.delete(&key) {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "failed to delete cache entry"),
            }
        }
        debug!(cleared, "cleared cache");
        cleared
    }

    /// Counts entries, their size, and how many are expired, without deleting
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut stats = CacheStats::default();
        for key in self.keys() {
            stats.count += 1;
            match self.store.size_of(&key) {
                Ok(size) => stats.total_size_bytes += size.unwrap_or(0),
                Err(e) => warn!(key = %key, error = %e, "failed to read cache entry size"),
            }
            if let Some(stored_at) = self.stored_at(&key) {
                if self.is_expired(stored_at, now) {
                    stats.expired_count += 1;
                }
            }
        }
        stats
    }
}
