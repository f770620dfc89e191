//! nodedeck Storage - Cache Store Contract and Implementations
//!
//! Defines the keyed, TTL-bounded store every panel reads through. The
//! store is best-effort: callers treat any failure as a miss.

pub mod cache;

pub use cache::{
    CacheEntry, CacheResult, CacheStats, CacheStore, DeviceScopedKey, DisabledCacheStore,
    InMemoryCacheStore, LmdbCacheError, LmdbCacheStore, TtlPolicy,
};
