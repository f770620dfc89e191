//! LMDB-backed cache store.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a memory-mapped,
//! file-backed key-value store that survives dashboard restarts.
//!
//! # Value Format
//!
//! `[captured_at millis: i64 LE][ttl millis: u64 LE][payload bytes]`
//!
//! Values shorter than the 16-byte header are treated as not found.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The store uses:
//! - Read transactions for `get` and prefix scans
//! - Write transactions for `put`, `delete` and `invalidate_device`
//! - Statistics are tracked behind an `RwLock`

use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use nodedeck_core::{CacheError, CacheKey, DeviceId, Payload, Timestamp};

use super::device_key::DeviceScopedKey;
use super::entry::CacheEntry;
use super::traits::{CacheResult, CacheStats, CacheStore};

/// Size of the timestamp + TTL header in front of every payload.
const HEADER_LEN: usize = 16;

/// Error type for LMDB environment setup and transactions.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for CacheError {
    fn from(e: LmdbCacheError) -> Self {
        match e {
            LmdbCacheError::Io(err) => CacheError::Io {
                reason: err.to_string(),
            },
            other => CacheError::Backend {
                reason: other.to_string(),
            },
        }
    }
}

fn txn_error(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// File-backed cache store.
///
/// # Example
///
/// ```ignore
/// use nodedeck_storage::cache::{CacheStore, LmdbCacheStore};
///
/// let store = LmdbCacheStore::new("/tmp/nodedeck-cache", 64)?;
/// store.put(&key, payload, Utc::now(), Duration::from_secs(60)).await?;
/// let cached = store.get(&key).await?;
/// ```
pub struct LmdbCacheStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    /// Global statistics.
    stats: RwLock<CacheStats>,
}

impl LmdbCacheStore {
    /// Open (or create) a store rooted at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the LMDB
    /// environment or database cannot be opened.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        let map_size = max_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                LmdbCacheError::EnvOpen(format!("map size of {} MB overflows", max_size_mb))
            })?;
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per directory by this
        // process; heed requires the caller to uphold that.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_error)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_error)?;

        let (entry_count, size_bytes) = {
            let rtxn = env.read_txn().map_err(txn_error)?;
            let mut count = 0u64;
            let mut size = 0u64;
            for result in db.iter(&rtxn).map_err(txn_error)? {
                let (_, value) = result.map_err(txn_error)?;
                count += 1;
                size += payload_len(value);
            }
            (count, size)
        };

        Ok(Self {
            env,
            db,
            stats: RwLock::new(CacheStats {
                entry_count,
                size_bytes,
                ..CacheStats::default()
            }),
        })
    }

    fn record_hit(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.hits += 1;
        }
    }

    fn record_miss(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.misses += 1;
        }
    }

    /// Iterate over keys matching a prefix and collect them with the
    /// payload size of their values.
    fn collect_keys_with_prefix(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, u64)>, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let iter = self.db.prefix_iter(&rtxn, prefix).map_err(txn_error)?;

        let mut keys = Vec::new();
        for result in iter {
            let (key, value) = result.map_err(txn_error)?;
            keys.push((key.to_vec(), payload_len(value)));
        }
        Ok(keys)
    }

    fn record_removed(&self, entries: u64, bytes: u64) {
        if let Ok(mut stats) = self.stats.write() {
            stats.entry_count = stats.entry_count.saturating_sub(entries);
            stats.size_bytes = stats.size_bytes.saturating_sub(bytes);
        }
    }
}

/// Payload bytes held by a stored value, excluding the header.
fn payload_len(value: &[u8]) -> u64 {
    value.len().saturating_sub(HEADER_LEN) as u64
}

/// Serialize an entry's metadata and payload into one value.
fn encode_value(payload: &Payload, captured_at: Timestamp, ttl: Duration) -> Vec<u8> {
    let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&captured_at.timestamp_millis().to_le_bytes());
    bytes.extend_from_slice(&ttl_millis.to_le_bytes());
    bytes.extend_from_slice(payload.as_bytes());
    bytes
}

fn decode_value(bytes: &[u8]) -> Option<CacheEntry> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    let captured_millis = i64::from_le_bytes(bytes[0..8].try_into().ok()?);
    let ttl_millis = u64::from_le_bytes(bytes[8..16].try_into().ok()?);
    let captured_at: DateTime<Utc> = DateTime::from_timestamp_millis(captured_millis)?;

    Some(CacheEntry::new(
        Payload::from_bytes(bytes[HEADER_LEN..].to_vec()),
        captured_at,
        Duration::from_millis(ttl_millis),
    ))
}

#[async_trait]
impl CacheStore for LmdbCacheStore {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let encoded_key = DeviceScopedKey::new(key)?.encode();
        let rtxn = self.env.read_txn().map_err(txn_error)?;

        match self.db.get(&rtxn, &encoded_key) {
            Ok(Some(bytes)) => match decode_value(bytes) {
                Some(entry) => {
                    self.record_hit();
                    Ok(Some(entry))
                }
                None => {
                    tracing::debug!(key = %key, len = bytes.len(), "Discarding malformed cache value");
                    self.record_miss();
                    Ok(None)
                }
            },
            Ok(None) => {
                self.record_miss();
                Ok(None)
            }
            Err(e) => {
                self.record_miss();
                Err(txn_error(e).into())
            }
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        payload: Payload,
        captured_at: Timestamp,
        ttl: Duration,
    ) -> CacheResult<()> {
        let encoded_key = DeviceScopedKey::new(key)?.encode();
        let value = encode_value(&payload, captured_at, ttl);

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let previous = self
            .db
            .get(&wtxn, &encoded_key)
            .map_err(txn_error)?
            .map(payload_len);
        self.db
            .put(&mut wtxn, &encoded_key, &value)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;

        if let Ok(mut stats) = self.stats.write() {
            match previous {
                Some(old_len) => {
                    stats.size_bytes = stats.size_bytes.saturating_sub(old_len);
                }
                None => stats.entry_count += 1,
            }
            stats.size_bytes += payload.len() as u64;
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let encoded_key = DeviceScopedKey::new(key)?.encode();

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let previous = self
            .db
            .get(&wtxn, &encoded_key)
            .map_err(txn_error)?
            .map(payload_len);
        let deleted = self.db.delete(&mut wtxn, &encoded_key).map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;

        if deleted {
            self.record_removed(1, previous.unwrap_or(0));
        }
        Ok(())
    }

    async fn invalidate_device(&self, device: &DeviceId) -> CacheResult<u64> {
        let prefix = DeviceScopedKey::device_prefix(device)?;
        let keys_to_delete = self.collect_keys_with_prefix(&prefix)?;

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let mut deleted = 0u64;
        let mut freed = 0u64;
        for (key, len) in &keys_to_delete {
            if self.db.delete(&mut wtxn, key).map_err(txn_error)? {
                deleted += 1;
                freed += len;
            }
        }
        wtxn.commit().map_err(txn_error)?;

        self.record_removed(deleted, freed);
        Ok(deleted)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Ok(self.stats.read().map(|s| s.clone()).unwrap_or_default())
    }
}
