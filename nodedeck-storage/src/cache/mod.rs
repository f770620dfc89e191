//! Cache layer for device panel data.
//!
//! Every cached artifact is addressed by a [`CacheKey`](nodedeck_core::CacheKey)
//! (`device`, `data type`) and stored as an opaque payload together with the
//! time it was captured and the TTL it was written with. Staleness is never
//! hidden: reads return a [`CacheEntry`] that callers check with
//! [`CacheEntry::is_stale_at`].
//!
//! # Backends
//!
//! - [`LmdbCacheStore`]: file-backed store surviving restarts.
//! - [`InMemoryCacheStore`]: process-local store, also used as a test fake.
//! - [`DisabledCacheStore`]: caching turned off; every read misses.
//!
//! # Example
//!
//! ```ignore
//! let store = LmdbCacheStore::new("/var/cache/nodedeck", 64)?;
//! store.put(&key, payload, Utc::now(), policy.ttl_for(key.data_type)).await?;
//!
//! if let Some(entry) = store.get(&key).await? {
//!     if entry.is_stale_at(Utc::now()) {
//!         // show it anyway, then revalidate in the background
//!     }
//! }
//! ```

pub mod device_key;
pub mod disabled;
pub mod entry;
pub mod lmdb_backend;
pub mod memory;
pub mod traits;
pub mod ttl;

pub use device_key::DeviceScopedKey;
pub use disabled::DisabledCacheStore;
pub use entry::CacheEntry;
pub use lmdb_backend::{LmdbCacheError, LmdbCacheStore};
pub use memory::InMemoryCacheStore;
pub use traits::{CacheResult, CacheStats, CacheStore};
pub use ttl::TtlPolicy;
