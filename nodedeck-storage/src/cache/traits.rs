//! Cache store trait and usage statistics.
//!
//! This module defines the contract every cache backend implements.

use async_trait::async_trait;
use nodedeck_core::{CacheError, CacheKey, DeviceId, Payload, Timestamp};
use std::time::Duration;

use super::entry::CacheEntry;

/// Result alias for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent key-value store for panel payloads.
///
/// At most one entry exists per [`CacheKey`]. A `put` replaces the previous
/// entry wholesale; entries are never mutated in place. Implementations must
/// be safe to share between panels, since keys are namespaced by device and
/// data type, concurrent writes to distinct keys never conflict.
///
/// Callers are expected to treat every error as "not found" (for reads) or
/// "log and continue" (for writes). The cache is never authoritative.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the entry for a key, or `None` if nothing is cached.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>>;

    /// Store a payload captured at `captured_at`, valid for `ttl`.
    async fn put(
        &self,
        key: &CacheKey,
        payload: Payload,
        captured_at: Timestamp,
        ttl: Duration,
    ) -> CacheResult<()>;

    /// Delete the entry for a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Delete every entry belonging to a device.
    ///
    /// Returns the number of entries removed.
    async fn invalidate_device(&self, device: &DeviceId) -> CacheResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Payload bytes held by live entries.
    pub size_bytes: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
