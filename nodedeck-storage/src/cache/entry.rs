//! Cached entries and their staleness check.
//!
//! An entry is stale once strictly more than its TTL has elapsed since it
//! was captured. Stale entries are still served; the caller decides whether
//! to revalidate.

use nodedeck_core::{Payload, Timestamp};
use std::time::Duration;

/// One immutable cached artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    payload: Payload,
    captured_at: Timestamp,
    ttl: Duration,
}

impl CacheEntry {
    pub fn new(payload: Payload, captured_at: Timestamp, ttl: Duration) -> Self {
        Self {
            payload,
            captured_at,
            ttl,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// When the payload was fetched from the device.
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time elapsed since capture. Zero if `captured_at` lies in the future.
    pub fn age_at(&self, now: Timestamp) -> Duration {
        now.signed_duration_since(self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_stale_at(&self, now: Timestamp) -> bool {
        self.age_at(now) > self.ttl
    }
}
