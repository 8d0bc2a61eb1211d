//! File-per-entry image cache store

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::recency::{NodeId, RecencyList};
use super::{CacheStats, ImageCache, LoadReport};
use crate::errors::{CacheError, CacheResult};
use crate::imaging;
use crate::utils::CacheKey;

/// Suffix of files being written; renamed over the entry file once complete
const PARTIAL_SUFFIX: &str = ".partial";

struct CacheEntry {
    key: CacheKey,
    image: Arc<DynamicImage>,
}

struct CacheState {
    index: HashMap<CacheKey, NodeId>,
    recency: RecencyList<CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// LRU image cache persisted as one JPEG file per entry
///
/// Every operation runs under one async mutex. A file is written before its
/// entry enters the index and deleted before its entry leaves it, so the
/// index never refers to a missing file.
pub struct ImageCacheStore {
    dir: PathBuf,
    capacity: NonZeroUsize,
    jpeg_quality: u8,
    state: Mutex<CacheState>,
}

impl ImageCacheStore {
    pub fn new<P: Into<PathBuf>>(dir: P, capacity: NonZeroUsize, jpeg_quality: u8) -> Self {
        Self {
            dir: dir.into(),
            capacity,
            jpeg_quality,
            state: Mutex::new(CacheState {
                index: HashMap::with_capacity(capacity.get()),
                recency: RecencyList::with_capacity(capacity.get()),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    async fn encode(&self, key: &CacheKey, image: Arc<DynamicImage>) -> CacheResult<Vec<u8>> {
        let quality = self.jpeg_quality;
        tokio::task::spawn_blocking(move || imaging::encode_jpeg(&image, quality))
            .await
            .map_err(|e| CacheError::Task {
                message: format!("encoding {key}: {e}"),
            })?
            .map_err(|source| CacheError::Encode {
                key: key.to_string(),
                source,
            })
    }

    /// Write through a temporary file so a crash never leaves a truncated entry
    async fn write_entry(&self, key: &CacheKey, jpeg: &[u8]) -> CacheResult<()> {
        let path = self.entry_path(key);
        let partial = self.dir.join(format!("{key}{PARTIAL_SUFFIX}"));

        let result = match tokio::fs::write(&partial, jpeg).await {
            Ok(()) => tokio::fs::rename(&partial, &path).await,
            Err(e) => Err(e),
        };

        if let Err(source) = result {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(CacheError::Write {
                key: key.to_string(),
                path,
                source,
            });
        }

        Ok(())
    }

    /// Drop the least recently used entry, file first
    ///
    /// If the file cannot be deleted the entry stays indexed and the error
    /// aborts the caller.
    async fn evict_back(&self, state: &mut CacheState) -> CacheResult<Option<CacheKey>> {
        let Some((id, entry)) = state.recency.back() else {
            return Ok(None);
        };
        let key = entry.key.clone();
        let path = self.entry_path(&key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(key = %key, "Evicted cache entry had no file on disk");
            }
            Err(source) => {
                return Err(CacheError::Evict {
                    key: key.to_string(),
                    path,
                    source,
                });
            }
        }

        state.recency.remove(id);
        state.index.remove(&key);
        state.evictions += 1;
        debug!(key = %key, "Evicted least recently used cache entry");

        Ok(Some(key))
    }

    /// Index an entry whose file is already in place
    async fn insert_entry(
        &self,
        state: &mut CacheState,
        key: CacheKey,
        image: Arc<DynamicImage>,
    ) -> CacheResult<Option<CacheKey>> {
        if let Some(&id) = state.index.get(&key) {
            if let Some(entry) = state.recency.get_mut(id) {
                entry.image = image;
            }
            state.recency.move_to_front(id);
            return Ok(None);
        }

        let evicted = if state.index.len() >= self.capacity.get() {
            self.evict_back(state).await?
        } else {
            None
        };

        let id = state.recency.push_front(CacheEntry {
            key: key.clone(),
            image,
        });
        state.index.insert(key, id);

        Ok(evicted)
    }

    /// Hit only when the entry exists and, if given, has `dimensions`
    async fn lookup(
        &self,
        key: &CacheKey,
        dimensions: Option<(u32, u32)>,
    ) -> Option<Arc<DynamicImage>> {
        let mut state = self.state.lock().await;

        let found = state.index.get(key).copied().and_then(|id| {
            let image = state.recency.get(id).map(|entry| Arc::clone(&entry.image))?;
            match dimensions {
                Some(wanted) if (image.width(), image.height()) != wanted => None,
                _ => Some((id, image)),
            }
        });

        match found {
            Some((id, image)) => {
                state.recency.move_to_front(id);
                state.hits += 1;
                Some(image)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    async fn decode_file(path: PathBuf) -> Option<DynamicImage> {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read cache file: {}", e);
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || imaging::decode(&bytes)).await {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                warn!(path = %path.display(), "Skipping undecodable cache file: {}", e);
                None
            }
            Err(e) => {
                warn!(path = %path.display(), "Decoding task failed for cache file: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ImageCache for ImageCacheStore {
    async fn get(&self, key: &CacheKey) -> Option<Arc<DynamicImage>> {
        self.lookup(key, None).await
    }

    async fn get_sized(
        &self,
        key: &CacheKey,
        width: u32,
        height: u32,
    ) -> Option<Arc<DynamicImage>> {
        self.lookup(key, Some((width, height))).await
    }

    async fn save(&self, key: CacheKey, image: Arc<DynamicImage>) -> CacheResult<()> {
        // Encoding does not depend on cache state, keep it outside the lock
        let jpeg = self.encode(&key, Arc::clone(&image)).await?;

        let mut state = self.state.lock().await;

        if let Some(&id) = state.index.get(&key) {
            self.write_entry(&key, &jpeg).await?;
            if let Some(entry) = state.recency.get_mut(id) {
                entry.image = image;
            }
            state.recency.move_to_front(id);
            debug!(key = %key, bytes = jpeg.len(), "Replaced cache entry");
            return Ok(());
        }

        if state.index.len() >= self.capacity.get() {
            self.evict_back(&mut state).await?;
        }

        self.write_entry(&key, &jpeg).await?;
        let id = state.recency.push_front(CacheEntry {
            key: key.clone(),
            image,
        });
        state.index.insert(key.clone(), id);

        debug!(
            key = %key,
            bytes = jpeg.len(),
            entries = state.index.len(),
            "Stored cache entry"
        );
        Ok(())
    }

    async fn load(&self) -> CacheResult<LoadReport> {
        let start_time = Instant::now();
        info!(dir = %self.dir.display(), "Loading image cache from disk");

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let read_dir_error = |source| CacheError::ReadDir {
            path: self.dir.clone(),
            source,
        };

        let mut report = LoadReport::default();
        let mut candidates: Vec<(SystemTime, CacheKey, PathBuf)> = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(read_dir_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), "Failed to stat cache file: {}", e);
                    report.skipped += 1;
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();

            if file_name.ends_with(PARTIAL_SUFFIX) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!(path = %path.display(), "Removed interrupted cache write");
                        report.removed_partials += 1;
                    }
                    Err(e) => warn!(
                        path = %path.display(),
                        "Failed to remove interrupted cache write: {}",
                        e
                    ),
                }
                continue;
            }

            let Some(key) = CacheKey::from_file_name(&file_name) else {
                debug!(path = %path.display(), "Ignoring file that is not a cache entry");
                report.skipped += 1;
                continue;
            };

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            candidates.push((modified, key, path));
        }

        // Oldest first, so the most recently written files end up most recently used
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        for (_, key, path) in candidates {
            let Some(image) = Self::decode_file(path).await else {
                report.skipped += 1;
                continue;
            };

            let mut state = self.state.lock().await;
            if self.insert_entry(&mut state, key, Arc::new(image)).await?.is_some() {
                report.evicted += 1;
            }
            report.loaded += 1;
        }

        let entries = self.state.lock().await.index.len();
        info!(
            "Image cache loaded: {} entries ({} files loaded, {} skipped, \
             {} partial writes removed, {} evicted) in {:.2}s",
            entries,
            report.loaded,
            report.skipped,
            report.removed_partials,
            report.evicted,
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    async fn clear(&self) -> CacheResult<usize> {
        info!(dir = %self.dir.display(), "Clearing image cache");
        let mut state = self.state.lock().await;

        let mut failed = 0usize;
        let mut first_failure: Option<(PathBuf, std::io::Error)> = None;

        match tokio::fs::read_dir(&self.dir).await {
            Ok(mut entries) => loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(dir = %self.dir.display(), "Listing stopped during clear: {}", e);
                        failed += 1;
                        first_failure.get_or_insert((self.dir.clone(), e));
                        break;
                    }
                };

                let path = entry.path();
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);

                // Entries are plain files, a directory under an entry name is left alone
                let removal = if is_dir && CacheKey::from_file_name(&file_name).is_none() {
                    tokio::fs::remove_dir_all(&path).await
                } else {
                    tokio::fs::remove_file(&path).await
                };

                match removal {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(path = %path.display(), "Failed to remove cache file: {}", e);
                        failed += 1;
                        first_failure.get_or_insert((path, e));
                    }
                }
            },
            // Nothing on disk, nothing to keep
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::ReadDir {
                    path: self.dir.clone(),
                    source,
                });
            }
        }

        // An entry leaves the index only once its file is gone
        let indexed: Vec<(CacheKey, NodeId)> =
            state.index.iter().map(|(key, id)| (key.clone(), *id)).collect();
        let mut dropped = 0usize;
        for (key, id) in indexed {
            match tokio::fs::try_exists(self.entry_path(&key)).await {
                Ok(false) => {
                    state.recency.remove(id);
                    state.index.remove(&key);
                    dropped += 1;
                }
                Ok(true) => {}
                Err(e) => warn!(key = %key, "Failed to check cache file, keeping entry: {}", e),
            }
        }
        if state.index.is_empty() {
            state.recency.clear();
        }

        match first_failure {
            None => {
                info!("Cleared {} cached images", dropped);
                Ok(dropped)
            }
            Some((path, source)) => Err(CacheError::Clear {
                failed,
                path,
                source,
            }),
        }
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.index.len(),
            capacity: self.capacity.get(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    impl ImageCacheStore {
        /// Whether `key` is cached, without touching its recency
        async fn contains(&self, key: &CacheKey) -> bool {
            self.state.lock().await.index.contains_key(key)
        }

        /// Cached keys from most to least recently used
        async fn keys(&self) -> Vec<CacheKey> {
            let state = self.state.lock().await;
            state.recency.iter().map(|entry| entry.key.clone()).collect()
        }
    }

    fn image(width: u32, height: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([200, 100, 50]),
        )))
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::from_origin(&format!("example.com/{name}")).unwrap()
    }

    fn store(dir: &Path, capacity: usize) -> ImageCacheStore {
        ImageCacheStore::new(dir, NonZeroUsize::new(capacity).unwrap(), 75)
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_save_evicts_least_recently_used() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 2);
        cache.load().await.unwrap();

        let (a, b, c) = (key("a.jpg"), key("b.jpg"), key("c.jpg"));
        cache.save(a.clone(), image(4, 4)).await.unwrap();
        cache.save(b.clone(), image(4, 4)).await.unwrap();
        cache.save(c.clone(), image(4, 4)).await.unwrap();

        assert!(!cache.contains(&a).await);
        assert!(cache.contains(&b).await);
        assert!(cache.contains(&c).await);
        assert_eq!(cache.keys().await, vec![c.clone(), b.clone()]);
        assert!(!temp_dir.path().join(a.as_str()).exists());

        let mut expected = vec![b.to_string(), c.to_string()];
        expected.sort();
        assert_eq!(files_in(temp_dir.path()), expected);
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_get_promotes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 2);

        let (a, b, c) = (key("a.jpg"), key("b.jpg"), key("c.jpg"));
        cache.save(a.clone(), image(4, 4)).await.unwrap();
        cache.save(b.clone(), image(4, 4)).await.unwrap();

        assert!(cache.get(&a).await.is_some());
        assert_eq!(cache.stats().await.entries, 2);

        cache.save(c.clone(), image(4, 4)).await.unwrap();
        assert!(cache.contains(&a).await);
        assert!(!cache.contains(&b).await);
        assert!(cache.contains(&c).await);
    }

    #[tokio::test]
    async fn test_resave_replaces_and_promotes() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 2);

        let (a, b, c) = (key("a.jpg"), key("b.jpg"), key("c.jpg"));
        cache.save(a.clone(), image(4, 4)).await.unwrap();
        cache.save(b.clone(), image(4, 4)).await.unwrap();
        cache.save(a.clone(), image(8, 2)).await.unwrap();

        assert_eq!(cache.stats().await.entries, 2);
        let replaced = cache.get(&a).await.unwrap();
        assert_eq!((replaced.width(), replaced.height()), (8, 2));

        cache.save(c.clone(), image(4, 4)).await.unwrap();
        assert!(cache.contains(&a).await);
        assert!(!cache.contains(&b).await);
    }

    #[tokio::test]
    async fn test_get_returns_saved_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 4);
        let a = key("a.jpg");

        assert!(cache.get(&a).await.is_none());
        cache.save(a.clone(), image(30, 20)).await.unwrap();

        let cached = cache.get(&a).await.unwrap();
        assert_eq!((cached.width(), cached.height()), (30, 20));

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));

        let bytes = std::fs::read(temp_dir.path().join(a.as_str())).unwrap();
        let on_disk = imaging::decode(&bytes).unwrap();
        assert_eq!((on_disk.width(), on_disk.height()), (30, 20));
    }

    #[tokio::test]
    async fn test_load_restores_saved_entries() {
        let temp_dir = TempDir::new().unwrap();
        let keys: Vec<CacheKey> = ["a.jpg", "b.jpg", "c.jpg"]
            .iter()
            .map(|name| key(name))
            .collect();

        {
            let cache = store(temp_dir.path(), 3);
            for key in &keys {
                cache.save(key.clone(), image(6, 3)).await.unwrap();
            }
        }

        let reloaded = store(temp_dir.path(), 3);
        let report = reloaded.load().await.unwrap();
        assert_eq!(report.loaded, 3);
        assert_eq!(report.evicted, 0);

        for key in &keys {
            let cached = reloaded.get(key).await.unwrap();
            assert_eq!((cached.width(), cached.height()), (6, 3));
        }
    }

    #[tokio::test]
    async fn test_load_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("cache");

        let cache = store(&dir, 2);
        let report = cache.load().await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(report, LoadReport::default());
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_load_skips_junk_and_removes_partials() {
        let temp_dir = TempDir::new().unwrap();
        let good = key("good.jpg");
        let corrupt = key("corrupt.jpg");

        {
            let cache = store(temp_dir.path(), 4);
            cache.save(good.clone(), image(5, 5)).await.unwrap();
        }
        std::fs::write(temp_dir.path().join(corrupt.as_str()), b"not a jpeg").unwrap();
        std::fs::write(temp_dir.path().join(format!("{good}.partial")), b"half").unwrap();
        std::fs::write(temp_dir.path().join("README.txt"), b"hello").unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        let cache = store(temp_dir.path(), 4);
        let report = cache.load().await.unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.removed_partials, 1);
        assert!(cache.contains(&good).await);
        assert!(!cache.contains(&corrupt).await);
        assert!(!temp_dir.path().join(format!("{good}.partial")).exists());
        assert!(logs_contain("Skipping undecodable cache file"));
    }

    #[tokio::test]
    async fn test_load_evicts_beyond_capacity() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = store(temp_dir.path(), 3);
            for name in ["a.jpg", "b.jpg", "c.jpg"] {
                cache.save(key(name), image(2, 2)).await.unwrap();
            }
        }

        let cache = store(temp_dir.path(), 2);
        let report = cache.load().await.unwrap();

        assert_eq!(report.loaded, 3);
        assert_eq!(report.evicted, 1);
        assert_eq!(cache.stats().await.entries, 2);
        assert_eq!(files_in(temp_dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_clear_empties_memory_and_disk() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 4);
        let (a, b) = (key("a.jpg"), key("b.jpg"));

        cache.save(a.clone(), image(4, 4)).await.unwrap();
        cache.save(b.clone(), image(4, 4)).await.unwrap();
        std::fs::create_dir(temp_dir.path().join("stray")).unwrap();
        std::fs::write(temp_dir.path().join("stray").join("file"), b"x").unwrap();

        let cleared = cache.clear().await.unwrap();

        assert_eq!(cleared, 2);
        assert_eq!(cache.stats().await.entries, 0);
        assert!(files_in(temp_dir.path()).is_empty());
        assert!(cache.get(&a).await.is_none());
        assert!(cache.get(&b).await.is_none());

        // Still usable afterwards
        cache.save(a.clone(), image(4, 4)).await.unwrap();
        assert!(cache.contains(&a).await);
    }

    #[tokio::test]
    async fn test_save_fails_when_directory_removed() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cache");
        let cache = store(&dir, 2);
        cache.load().await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();

        let a = key("a.jpg");
        let result = cache.save(a.clone(), image(4, 4)).await;
        assert!(matches!(result, Err(CacheError::Write { .. })));
        assert!(!cache.contains(&a).await);
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_eviction_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 1);
        let (a, b) = (key("a.jpg"), key("b.jpg"));

        cache.save(a.clone(), image(4, 4)).await.unwrap();
        std::fs::remove_file(temp_dir.path().join(a.as_str())).unwrap();

        cache.save(b.clone(), image(4, 4)).await.unwrap();
        assert_eq!(cache.keys().await, vec![b]);
    }

    #[tokio::test]
    async fn test_get_sized_counts_other_size_as_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 2);
        let (a, b) = (key("a.jpg"), key("b.jpg"));

        cache.save(a.clone(), image(30, 20)).await.unwrap();
        cache.save(b.clone(), image(30, 20)).await.unwrap();

        assert!(cache.get_sized(&a, 10, 10).await.is_none());
        // A wrong-size lookup does not promote
        assert_eq!(cache.keys().await, vec![b.clone(), a.clone()]);

        let cached = cache.get_sized(&a, 30, 20).await.unwrap();
        assert_eq!((cached.width(), cached.height()), (30, 20));
        assert_eq!(cache.keys().await, vec![a, b]);

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_eviction_delete_failure_aborts_save() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 1);
        let (a, b) = (key("a.jpg"), key("b.jpg"));

        cache.save(a.clone(), image(4, 4)).await.unwrap();

        // A non-empty directory in place of the entry file cannot be unlinked
        let a_path = temp_dir.path().join(a.as_str());
        std::fs::remove_file(&a_path).unwrap();
        std::fs::create_dir(&a_path).unwrap();
        std::fs::write(a_path.join("inner"), b"x").unwrap();

        let result = cache.save(b.clone(), image(4, 4)).await;

        assert!(matches!(result, Err(CacheError::Evict { .. })));
        assert!(cache.contains(&a).await);
        assert!(!cache.contains(&b).await);
        assert!(!temp_dir.path().join(b.as_str()).exists());
        assert_eq!(files_in(temp_dir.path()), vec![a.to_string()]);
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_clear_keeps_entries_whose_files_remain() {
        let temp_dir = TempDir::new().unwrap();
        let cache = store(temp_dir.path(), 4);
        let (a, b, c) = (key("a.jpg"), key("b.jpg"), key("c.jpg"));

        for k in [&a, &b, &c] {
            cache.save(k.clone(), image(4, 4)).await.unwrap();
        }

        let b_path = temp_dir.path().join(b.as_str());
        std::fs::remove_file(&b_path).unwrap();
        std::fs::create_dir(&b_path).unwrap();
        std::fs::write(b_path.join("inner"), b"x").unwrap();

        let result = cache.clear().await;

        assert!(matches!(result, Err(CacheError::Clear { failed: 1, .. })));
        assert!(!cache.contains(&a).await);
        assert!(cache.contains(&b).await);
        assert!(!cache.contains(&c).await);
        assert_eq!(cache.keys().await, vec![b.clone()]);
        assert_eq!(files_in(temp_dir.path()), vec![b.to_string()]);
        assert_eq!(cache.stats().await.entries, 1);
    }
}
