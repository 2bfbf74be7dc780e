//! In-memory profile cache with least-recently-used eviction.

use super::{CacheStats, ProfileCache, ProfileKey};
use crate::core::profile::ImageProfile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Entries kept by [`InMemoryCache::new`]
pub const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug)]
struct Slot {
    profile: Arc<ImageProfile>,
    last_used: AtomicU64,
}

/// In-memory cache backend
///
/// Shared by every call made through one detector and bounded to `capacity`
/// entries; inserting past the bound evicts the least recently used entry.
/// Entries are immutable once inserted, so a poisoned lock still holds
/// consistent data.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<ProfileKey, Slot>>,
    capacity: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    /// Cache holding at most [`DEFAULT_CAPACITY`] profiles
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` profiles; 0 disables caching
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCache for InMemoryCache {
    fn get(&self, key: &ProfileKey) -> Option<Arc<ImageProfile>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(slot) => {
                slot.last_used.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(digest = key.digest, "profile cache hit");
                Some(Arc::clone(&slot.profile))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: ProfileKey, profile: Arc<ImageProfile>) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let slot = Slot {
            profile,
            last_used: AtomicU64::new(self.tick()),
        };
        entries.insert(key, slot);

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| *key);
            let Some(oldest) = oldest else { break };
            entries.remove(&oldest);
            debug!(digest = oldest.digest, capacity = self.capacity, "evicted cached profile");
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        CacheStats {
            total_entries: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
