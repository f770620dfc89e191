//! Cache orchestrator.
//!
//! Decides, per key, whether to serve from cache, serve-then-revalidate or
//! fetch-and-block. All store I/O and fetches run as independent tokio
//! tasks; their outcome is posted back as a [`CacheEvent`] on a channel
//! consumed by the single UI event loop. Nothing here touches panel state.
//!
//! In-flight work is never cancelled. Every event carries the
//! [`Generation`] of the request that produced it, and the owning panel
//! drops events that no longer match its current request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nodedeck_core::{CacheKey, DeviceId, FetchError, Generation, PanelData, Payload, Timestamp};
use nodedeck_storage::{CacheEntry, CacheStats, CacheStore, TtlPolicy};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::fetch::FetchRequest;

/// Source of "now" for staleness checks and capture timestamps.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Lifecycle event delivered to the panel owning `key`.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub key: CacheKey,
    pub generation: Generation,
    pub kind: CacheEventKind,
}

#[derive(Debug, Clone)]
pub enum CacheEventKind {
    /// Nothing cached. Follow up with a blocking fetch.
    Miss,
    /// Cached payload found. When `needs_refresh` is set the entry is past
    /// its TTL: display it, then revalidate in the background.
    Hit {
        payload: Payload,
        captured_at: Timestamp,
        needs_refresh: bool,
    },
    /// Outcome of a blocking fetch.
    Loaded(Result<Fetched, FetchError>),
    /// Outcome of a background refresh.
    RefreshComplete(Result<Fetched, FetchError>),
}

/// A fetched payload and the capture time it was written to the store with.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub payload: Payload,
    pub captured_at: Timestamp,
}

impl CacheEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            CacheEventKind::Miss => "miss",
            CacheEventKind::Hit { .. } => "hit",
            CacheEventKind::Loaded(_) => "loaded",
            CacheEventKind::RefreshComplete(_) => "refresh_complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Blocking,
    Background,
    Reload,
}

/// Shared handle; clones post to the same event channel and store.
#[derive(Clone)]
pub struct CacheOrchestrator {
    store: Arc<dyn CacheStore>,
    ttl: Arc<TtlPolicy>,
    clock: Clock,
    events: mpsc::UnboundedSender<CacheEvent>,
}

impl CacheOrchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        ttl: TtlPolicy,
        events: mpsc::UnboundedSender<CacheEvent>,
    ) -> Self {
        Self {
            store,
            ttl: Arc::new(ttl),
            clock: Arc::new(Utc::now),
            events,
        }
    }

    /// Replace the wall clock, e.g. to simulate elapsed time.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Look the key up in the store and emit `Miss` or `Hit`.
    pub fn load(&self, key: CacheKey, generation: Generation) {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();

        tokio::spawn(async move {
            let kind = match best_effort_get(store.as_ref(), &key).await {
                Some(entry) => {
                    let needs_refresh = entry.is_stale_at(clock());
                    CacheEventKind::Hit {
                        captured_at: entry.captured_at(),
                        payload: entry.into_payload(),
                        needs_refresh,
                    }
                }
                None => CacheEventKind::Miss,
            };
            post(&events, key, generation, kind);
        });
    }

    /// Fetch, cache on success, and emit `Loaded`.
    pub fn fetch_blocking<T: PanelData>(&self, request: FetchRequest<T>) {
        self.spawn_fetch(request, FetchMode::Blocking);
    }

    /// Fetch, cache on success, and emit `RefreshComplete`.
    pub fn refresh_background<T: PanelData>(&self, request: FetchRequest<T>) {
        self.spawn_fetch(request, FetchMode::Background);
    }

    /// Invalidate, then fetch, inside one task so the delete always lands
    /// before the new entry is written. Emits `Loaded`.
    pub fn reload<T: PanelData>(&self, request: FetchRequest<T>) {
        self.spawn_fetch(request, FetchMode::Reload);
    }

    /// Delete the entry for `key`. Does not affect what is displayed.
    pub async fn invalidate(&self, key: &CacheKey) {
        best_effort_delete(self.store.as_ref(), key).await;
    }

    /// Drop every cached entry of a device. Failures count as zero removed.
    pub async fn invalidate_device(&self, device: &DeviceId) -> u64 {
        match self.store.invalidate_device(device).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(device = %device, error = %e, "Cache purge failed");
                0
            }
        }
    }

    pub async fn stats(&self) -> Option<CacheStats> {
        self.store.stats().await.ok()
    }

    fn spawn_fetch<T: PanelData>(&self, request: FetchRequest<T>, mode: FetchMode) {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let ttl = self.ttl.ttl_for(request.key.data_type);
        let events = self.events.clone();

        tokio::spawn(async move {
            if mode == FetchMode::Reload {
                best_effort_delete(store.as_ref(), &request.key).await;
            }

            let result = request.run().await.map(|payload| Fetched {
                payload,
                captured_at: clock(),
            });
            match &result {
                Ok(fetched) => {
                    if let Err(e) = store
                        .put(&request.key, fetched.payload.clone(), fetched.captured_at, ttl)
                        .await
                    {
                        warn!(key = %request.key, error = %e, "Cache write failed");
                    }
                }
                Err(e) => {
                    debug!(key = %request.key, generation = %request.generation, error = %e, "Fetch failed");
                }
            }

            let kind = match mode {
                FetchMode::Blocking | FetchMode::Reload => CacheEventKind::Loaded(result),
                FetchMode::Background => CacheEventKind::RefreshComplete(result),
            };
            post(&events, request.key, request.generation, kind);
        });
    }
}

/// Store read where any failure counts as a miss.
async fn best_effort_get(store: &dyn CacheStore, key: &CacheKey) -> Option<CacheEntry> {
    match store.get(key).await {
        Ok(entry) => entry,
        Err(e) => {
            warn!(key = %key, error = %e, "Cache read failed, treating as miss");
            None
        }
    }
}

async fn best_effort_delete(store: &dyn CacheStore, key: &CacheKey) {
    if let Err(e) = store.delete(key).await {
        warn!(key = %key, error = %e, "Cache invalidation failed");
    }
}

fn post(
    events: &mpsc::UnboundedSender<CacheEvent>,
    key: CacheKey,
    generation: Generation,
    kind: CacheEventKind,
) {
    let event = CacheEvent {
        key,
        generation,
        kind,
    };
    if let Err(err) = events.send(event) {
        debug!(key = %err.0.key, "Event loop gone, dropping cache event");
    }
}

/// Convenience for TTL math in callers holding only an orchestrator.
pub fn is_expired(captured_at: Timestamp, ttl: Duration, now: Timestamp) -> bool {
    now.signed_duration_since(captured_at)
        .to_std()
        .map(|age| age > ttl)
        .unwrap_or(false)
}
