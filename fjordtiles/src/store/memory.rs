//! In-memory tile store.
//!
//! Same contract as the disk store with no persistence. Used by tests and
//! by callers that want a throwaway cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::Mutex;

use super::clock::Clock;
use super::traits::{BoxFuture, StoreError, TileStore};
use crate::tile::TileRecord;

#[derive(Debug, Clone)]
struct StoredTile {
    payload: Bytes,
    written_at: SystemTime,
}

/// HashMap-backed tile store.
pub struct MemoryTileStore {
    clock: Arc<dyn Clock>,
    tiles: Mutex<HashMap<String, StoredTile>>,
}

impl MemoryTileStore {
    /// An empty store stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tiles: Mutex::new(HashMap::new()),
        }
    }
}

impl TileStore for MemoryTileStore {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>> {
        let url = url.to_owned();
        Box::pin(async move {
            let record = self.tiles.lock().get(&url).map(|stored| TileRecord {
                url: url.clone(),
                payload: stored.payload.clone(),
                written_at: stored.written_at,
            });
            Ok(record)
        })
    }

    fn put(&self, url: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        let url = url.to_owned();
        Box::pin(async move {
            let stored = StoredTile {
                payload: payload.into(),
                written_at: self.clock.now(),
            };
            self.tiles.lock().insert(url, stored);
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move { Ok(self.tiles.lock().len() as u64) })
    }

    fn delete_oldest(&self, n: u64) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            let mut tiles = self.tiles.lock();
            let mut order: Vec<(SystemTime, String)> = tiles
                .iter()
                .map(|(url, stored)| (stored.written_at, url.clone()))
                .collect();
            order.sort();

            let mut removed = 0;
            for (_, url) in order.into_iter().take(n as usize) {
                if tiles.remove(&url).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.tiles.lock().clear();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::clock::ManualClock;

    fn store() -> (MemoryTileStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        (MemoryTileStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_round_trip_and_count() {
        let (store, _) = store();

        store.put("tile/1", b"one".to_vec()).await.unwrap();
        store.put("tile/2", b"two".to_vec()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let record = store.get("tile/1").await.unwrap().unwrap();
        assert_eq!(record.payload.as_ref(), b"one");
        assert!(store.get("tile/3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oldest_goes_first() {
        let (store, clock) = store();

        store.put("tile/old", b"x".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(1));
        store.put("tile/new", b"y".to_vec()).await.unwrap();

        store.delete_oldest(1).await.unwrap();
        assert!(store.get("tile/old").await.unwrap().is_none());
        assert!(store.get("tile/new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_timestamp_ties_break_by_key_order() {
        let (store, _) = store();

        // All written at the same frozen instant.
        store.put("tile/b", b"b".to_vec()).await.unwrap();
        store.put("tile/a", b"a".to_vec()).await.unwrap();
        store.put("tile/c", b"c".to_vec()).await.unwrap();

        store.delete_oldest(1).await.unwrap();
        assert!(store.get("tile/a").await.unwrap().is_none());
        assert!(store.get("tile/b").await.unwrap().is_some());
        assert!(store.get("tile/c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let (store, _) = store();
        store.put("tile/1", b"x".to_vec()).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
