//! Cache backend trait definition.

use super::{CacheStats, ProfileKey};
use crate::core::profile::ImageProfile;
use std::sync::Arc;

/// Trait for profile caches
pub trait ProfileCache: Send + Sync {
    /// Get a cached profile if present
    fn get(&self, key: &ProfileKey) -> Option<Arc<ImageProfile>>;

    /// Store a profile
    fn insert(&self, key: ProfileKey, profile: Arc<ImageProfile>);

    /// Clear all cached entries
    fn clear(&self);

    /// Get cache statistics
    fn stats(&self) -> CacheStats;
}
