//! Single-slot, time-stamped payload cache with lazy expiry.

use std::time::Duration;

use tokio::time::Instant;

/// A payload and the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: Instant,
}

/// Holds at most one entry.  Stale entries are never purged, only hidden:
/// the next successful fetch overwrites them.
#[derive(Debug)]
pub struct CacheStore<T> {
    ttl: Duration,
    slot: Option<CacheEntry<T>>,
}

impl<T> CacheStore<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    /// The entry, if it is younger than the TTL.
    pub fn get(&self) -> Option<&CacheEntry<T>> {
        self.slot
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
    }

    /// Replace the slot wholesale.
    pub fn put(&mut self, payload: T) {
        self.slot = Some(CacheEntry {
            payload,
            fetched_at: Instant::now(),
        });
    }
}
