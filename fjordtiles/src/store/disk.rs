//! Disk-backed tile store.
//!
//! One file per tile under the cache directory, named by the SHA-256 of
//! the tile URL and sharded into two-hex-character subdirectories to keep
//! directory fan-out flat:
//!
//! ```text
//! <cache_dir>/ab/ab34...ef.tile
//! ```
//!
//! An in-memory index maps hashed key to path and write time. The index
//! is rebuilt from a directory scan on open, using file mtime as the
//! write time, so eviction order survives restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::clock::Clock;
use super::traits::{BoxFuture, StoreError, TileStore};
use crate::tile::TileRecord;

/// File extension for stored tiles.
const TILE_EXT: &str = "tile";

/// Hashed store key for a tile URL.
pub fn tile_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{digest:x}")
}

/// Path a tile URL is stored at under `cache_dir`.
pub fn tile_path(cache_dir: &Path, url: &str) -> PathBuf {
    let key = tile_key(url);
    cache_dir.join(&key[..2]).join(format!("{key}.{TILE_EXT}"))
}

#[derive(Debug, Clone)]
struct IndexEntry {
    path: PathBuf,
    written_at: SystemTime,
}

/// Persistent tile store over a cache directory.
pub struct DiskTileStore {
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
    index: Mutex<HashMap<String, IndexEntry>>,
}

impl DiskTileStore {
    /// Open the store, creating `cache_dir` if needed and rebuilding the
    /// index from the files already on disk.
    pub fn open(cache_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        if !cache_dir.is_dir() {
            return Err(StoreError::InvalidCacheDir {
                path: cache_dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let index = scan_cache_dir(&cache_dir)?;
        debug!(
            cache_dir = %cache_dir.display(),
            tiles = index.len(),
            "opened disk tile store"
        );

        Ok(Self {
            cache_dir,
            clock,
            index: Mutex::new(index),
        })
    }

    fn lookup(&self, key: &str) -> Option<IndexEntry> {
        self.index.lock().get(key).cloned()
    }
}

impl TileStore for DiskTileStore {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>> {
        let url = url.to_owned();
        Box::pin(async move {
            let key = tile_key(&url);
            let Some(entry) = self.lookup(&key) else {
                return Ok(None);
            };

            match tokio::fs::read(&entry.path).await {
                Ok(payload) => Ok(Some(TileRecord {
                    url,
                    payload: payload.into(),
                    written_at: entry.written_at,
                })),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // File vanished under us; drop the stale index entry
                    // and report an ordinary miss.
                    self.index.lock().remove(&key);
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn put(&self, url: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        let url = url.to_owned();
        Box::pin(async move {
            let key = tile_key(&url);
            let path = tile_path(&self.cache_dir, &url);

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &payload).await?;

            let written_at = self.clock.now();
            self.index.lock().insert(key, IndexEntry { path, written_at });
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move { Ok(self.index.lock().len() as u64) })
    }

    fn delete_oldest(&self, n: u64) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            let victims: Vec<(String, PathBuf)> = {
                let mut index = self.index.lock();
                let mut order: Vec<(SystemTime, String)> = index
                    .iter()
                    .map(|(key, entry)| (entry.written_at, key.clone()))
                    .collect();
                order.sort();

                order
                    .into_iter()
                    .take(n as usize)
                    .filter_map(|(_, key)| {
                        index.remove(&key).map(|entry| (key, entry.path))
                    })
                    .collect()
            };

            for (key, path) in &victims {
                // A file already gone is fine; the record is gone either way.
                if let Err(e) = tokio::fs::remove_file(path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(key = %key, error = %e, "failed to delete evicted tile file");
                    }
                }
            }

            Ok(victims.len() as u64)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let paths: Vec<PathBuf> = {
                let mut index = self.index.lock();
                let paths = index.values().map(|entry| entry.path.clone()).collect();
                index.clear();
                paths
            };

            for path in paths {
                let _ = tokio::fs::remove_file(&path).await;
            }
            Ok(())
        })
    }
}

/// Build the index from the files already in the cache directory.
///
/// Write times come from file mtime, which is how they were ordered when
/// the previous process wrote them.
fn scan_cache_dir(cache_dir: &Path) -> Result<HashMap<String, IndexEntry>, StoreError> {
    let mut index = HashMap::new();

    for shard in std::fs::read_dir(cache_dir)? {
        let shard = shard?;
        if !shard.file_type()?.is_dir() {
            continue;
        }

        for file in std::fs::read_dir(shard.path())? {
            let file = file?;
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TILE_EXT) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let written_at = file
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            index.insert(
                key.to_string(),
                IndexEntry { path, written_at },
            );
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::store::clock::ManualClock;

    fn store_in(dir: &TempDir) -> (DiskTileStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        let store = DiskTileStore::open(dir.path(), clock.clone()).unwrap();
        (store, clock)
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put("tile/5/10/12", b"payload".to_vec()).await.unwrap();
        let record = store.get("tile/5/10/12").await.unwrap().unwrap();

        assert_eq!(record.url, "tile/5/10/12");
        assert_eq!(record.payload.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_miss_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        assert!(store.get("tile/never/seen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let (store, clock) = store_in(&dir);

        store.put("tile/1", b"old".to_vec()).await.unwrap();
        let first = store.get("tile/1").await.unwrap().unwrap();

        clock.advance(Duration::from_secs(10));
        store.put("tile/1", b"new".to_vec()).await.unwrap();
        let second = store.get("tile/1").await.unwrap().unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(second.payload.as_ref(), b"new");
        assert!(second.written_at > first.written_at);
    }

    #[tokio::test]
    async fn test_delete_oldest_removes_smallest_timestamps_first() {
        let dir = TempDir::new().unwrap();
        let (store, clock) = store_in(&dir);

        for name in ["tile/a", "tile/b", "tile/c"] {
            store.put(name, name.as_bytes().to_vec()).await.unwrap();
            clock.advance(Duration::from_secs(1));
        }

        let removed = store.delete_oldest(2).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("tile/a").await.unwrap().is_none());
        assert!(store.get("tile/b").await.unwrap().is_none());
        assert!(store.get("tile/c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_oldest_count_arithmetic() {
        let dir = TempDir::new().unwrap();
        let (store, clock) = store_in(&dir);

        for i in 0..5 {
            store.put(&format!("tile/{i}"), vec![i]).await.unwrap();
            clock.advance(Duration::from_secs(1));
        }

        store.delete_oldest(3).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_more_than_exist_empties_the_store() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put("tile/only", b"x".to_vec()).await.unwrap();
        let removed = store.delete_oldest(10).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put("tile/a", b"a".to_vec()).await.unwrap();
        store.put("tile/b", b"b".to_vec()).await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get("tile/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vanished_file_reads_as_miss() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put("tile/gone", b"x".to_vec()).await.unwrap();
        std::fs::remove_file(tile_path(dir.path(), "tile/gone")).unwrap();

        assert!(store.get("tile/gone").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopen_rebuilds_index_from_mtime() {
        let dir = TempDir::new().unwrap();
        {
            let (store, _) = store_in(&dir);
            store.put("tile/old", b"old".to_vec()).await.unwrap();
            store.put("tile/new", b"new".to_vec()).await.unwrap();
        }

        // Back-date one file so mtime order is unambiguous.
        filetime::set_file_mtime(
            tile_path(dir.path(), "tile/old"),
            filetime::FileTime::from_unix_time(1_000, 0),
        )
        .unwrap();
        filetime::set_file_mtime(
            tile_path(dir.path(), "tile/new"),
            filetime::FileTime::from_unix_time(2_000, 0),
        )
        .unwrap();

        let (store, _) = store_in(&dir);
        assert_eq!(store.count().await.unwrap(), 2);

        store.delete_oldest(1).await.unwrap();
        assert!(store.get("tile/old").await.unwrap().is_none());
        assert!(store.get("tile/new").await.unwrap().is_some());
    }

    #[test]
    fn test_tile_path_is_sharded_by_hash_prefix() {
        let path = tile_path(Path::new("/cache"), "https://a.tile.example/1/2/3.png");
        let key = tile_key("https://a.tile.example/1/2/3.png");

        assert_eq!(key.len(), 64);
        assert_eq!(
            path,
            Path::new("/cache").join(&key[..2]).join(format!("{key}.tile"))
        );
    }
}
