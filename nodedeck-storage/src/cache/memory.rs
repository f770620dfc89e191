//! In-memory cache store.
//!
//! Used when no cache directory is available and as the store fake in
//! tests. Individual operations can be forced to fail to exercise the
//! best-effort policy of callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use nodedeck_core::{CacheError, CacheKey, DeviceId, Payload, Timestamp};

use super::entry::CacheEntry;
use super::traits::{CacheResult, CacheStats, CacheStore};

#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    stats: RwLock<CacheStats>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` and `invalidate_device` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Peek at an entry without touching hit/miss statistics.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn injected(flag: &AtomicBool, op: &str) -> CacheResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Backend {
                reason: format!("injected {} failure", op),
            });
        }
        Ok(())
    }
}

fn poisoned() -> CacheError {
    CacheError::Backend {
        reason: "cache lock poisoned".to_string(),
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        Self::injected(&self.fail_gets, "get")?;
        let entry = self.entries.read().map_err(|_| poisoned())?.get(key).cloned();
        if let Ok(mut stats) = self.stats.write() {
            if entry.is_some() {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }
        Ok(entry)
    }

    async fn put(
        &self,
        key: &CacheKey,
        payload: Payload,
        captured_at: Timestamp,
        ttl: Duration,
    ) -> CacheResult<()> {
        Self::injected(&self.fail_puts, "put")?;
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(key.clone(), CacheEntry::new(payload, captured_at, ttl));
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        Self::injected(&self.fail_deletes, "delete")?;
        self.entries.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    async fn invalidate_device(&self, device: &DeviceId) -> CacheResult<u64> {
        Self::injected(&self.fail_deletes, "invalidate")?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|key, _| &key.device != device);
        Ok((before - entries.len()) as u64)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let mut stats = self.stats.read().map(|s| s.clone()).unwrap_or_default();
        let entries = self.entries.read().map_err(|_| poisoned())?;
        stats.entry_count = entries.len() as u64;
        stats.size_bytes = entries.values().map(|e| e.payload().len() as u64).sum();
        Ok(stats)
    }
}
