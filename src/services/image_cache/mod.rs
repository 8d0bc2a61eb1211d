//! Disk-backed LRU cache of resized previews
//!
//! The cache holds decoded images in memory, bounded by entry count, and
//! mirrors every entry to one JPEG file named by its key under a single
//! directory. The directory is the only persisted state: [`ImageCache::load`]
//! rebuilds the in-memory index from it after a restart.

pub mod recency;
pub mod store;

use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;

use crate::errors::CacheResult;
use crate::utils::CacheKey;

pub use recency::{NodeId, RecencyList};
pub use store::ImageCacheStore;

/// Point-in-time cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Outcome of rebuilding the cache from disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Files decoded and indexed
    pub loaded: usize,
    /// Files that were not cache entries or failed to decode
    pub skipped: usize,
    /// Interrupted writes that were removed
    pub removed_partials: usize,
    /// Entries pushed out again because the directory held more than the capacity
    pub evicted: usize,
}

#[async_trait]
pub trait ImageCache: Send + Sync {
    /// Look up an entry, marking it most recently used on a hit
    async fn get(&self, key: &CacheKey) -> Option<Arc<DynamicImage>>;

    /// Like [`ImageCache::get`], but an entry of another size counts as a miss
    /// and keeps its recency
    async fn get_sized(
        &self,
        key: &CacheKey,
        width: u32,
        height: u32,
    ) -> Option<Arc<DynamicImage>>;

    /// Store an entry, evicting the least recently used one when full
    async fn save(&self, key: CacheKey, image: Arc<DynamicImage>) -> CacheResult<()>;

    /// Rebuild the index from the cache directory
    async fn load(&self) -> CacheResult<LoadReport>;

    /// Remove every entry from memory and disk, returning the number of entries dropped
    async fn clear(&self) -> CacheResult<usize>;

    async fn stats(&self) -> CacheStats;
}
