//! # Cache Module
//!
//! Keeps image profiles in memory so identical inputs are profiled once.
//!
//! ## Keys
//! Entries are keyed by the xxh3 digest of the encoded bytes together with the
//! profiling options that shaped the profile. Two uploads of the same file hit
//! the same entry; the same file profiled without pHash does not.
//!
//! Nothing is persisted; the cache lives as long as its `Detector` and holds
//! at most a fixed number of profiles, evicting the least recently used.

mod memory;
mod traits;

pub use memory::{InMemoryCache, DEFAULT_CAPACITY};
pub use traits::ProfileCache;

use crate::core::hasher::DcTerm;
use serde::{Deserialize, Serialize};

/// Identifies a profile computed from given bytes with given options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    /// xxh3 digest of the encoded bytes
    pub digest: u64,
    /// Whether pHash was computed
    pub perceptual: bool,
    /// pHash DC handling
    pub dc_term: DcTerm,
    /// Whether quality metrics were computed
    pub quality: bool,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that missed
    pub misses: u64,
}

impl CacheStats {
    /// Share of lookups served from the cache (0-1)
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}
