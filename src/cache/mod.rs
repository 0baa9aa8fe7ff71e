//! Response cache for catalog API calls
//!
//! Responses are keyed by a fingerprint of the endpoint and its parameters and
//! persisted through a `KvStore` (one JSON document per key). Entries older than
//! the configured TTL are treated as absent and deleted the next time they are
//! looked up; `clear_expired` and `stats` give explicit maintenance on top.

mod fingerprint;
mod manager;

pub use fingerprint::{fingerprint, params, Params};
pub use manager::{CacheStats, ResponseCache, DEFAULT_TTL_DAYS};
