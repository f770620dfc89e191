//! Store used when caching is turned off.
//!
//! Every read misses and every write is dropped, so callers degrade to
//! "always fetch" without special-casing a missing cache.

use std::time::Duration;

use async_trait::async_trait;
use nodedeck_core::{CacheKey, DeviceId, Payload, Timestamp};

use super::entry::CacheEntry;
use super::traits::{CacheResult, CacheStats, CacheStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCacheStore;

#[async_trait]
impl CacheStore for DisabledCacheStore {
    async fn get(&self, _key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &CacheKey,
        _payload: Payload,
        _captured_at: Timestamp,
        _ttl: Duration,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &CacheKey) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate_device(&self, _device: &DeviceId) -> CacheResult<u64> {
        Ok(0)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Ok(CacheStats::default())
    }
}
