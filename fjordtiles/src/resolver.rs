//! Cache-or-fetch tile resolution.
//!
//! [`TileResolver::resolve`] is what the map widget calls per grid cell.
//! It answers from the store when it can, falls back to the network, and
//! degrades to [`TileImage::Unavailable`] when both fail. No error ever
//! escapes into the render path; a broken cache draws as a blank tile,
//! not a crash.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::provider::HttpFetch;
use crate::store::{spawn_trim, CacheStats, StoreError, TileStore, TrimTrigger, Trimmer};
use crate::tile::TileImage;

/// Resolves tile URLs to renderable images, cache first.
pub struct TileResolver<H> {
    store: Arc<dyn TileStore>,
    fetcher: Arc<H>,
    trimmer: Arc<Trimmer>,
    trigger: TrimTrigger,
}

impl<H: HttpFetch> TileResolver<H> {
    /// A resolver over the given store and fetcher.
    ///
    /// `trigger` decides, per successful network write, whether to spawn
    /// `trimmer` for a detached capacity check.
    pub fn new(
        store: Arc<dyn TileStore>,
        fetcher: Arc<H>,
        trimmer: Arc<Trimmer>,
        trigger: TrimTrigger,
    ) -> Self {
        Self {
            store,
            fetcher,
            trimmer,
            trigger,
        }
    }

    /// Resolve a tile URL to something renderable.
    ///
    /// Order of fallback: store, then network with write-back, then
    /// [`TileImage::Unavailable`]. A cache hit does not refresh the
    /// record's timestamp; residency tracks write recency by design.
    pub async fn resolve(&self, url: &str) -> TileImage {
        match self.store.get(url).await {
            Ok(Some(record)) => {
                debug!(url, "tile cache hit");
                return TileImage::Ready(record.payload);
            }
            Ok(None) => {}
            Err(error) => {
                // A failing store downgrades to a miss; the network can
                // still produce the tile.
                warn!(url, %error, "tile store read failed, trying network");
            }
        }

        let body = match self.fetcher.get(url).await {
            Ok(body) => body,
            Err(error) => {
                debug!(url, %error, "tile fetch failed");
                return TileImage::Unavailable;
            }
        };

        if let Err(error) = image::guess_format(&body) {
            warn!(url, %error, "fetched payload is not an image");
            return TileImage::Unavailable;
        }

        let payload = Bytes::from(body);
        if let Err(error) = self.store.put(url, payload.to_vec()).await {
            // A failed write-back must not fail the render; the tile is
            // simply not cached this time.
            warn!(url, %error, "tile write-back failed");
        }

        if self.trigger.should_run() {
            spawn_trim(Arc::clone(&self.trimmer));
        }

        TileImage::Ready(payload)
    }

    /// Current store statistics for UI display.
    ///
    /// A store failure reads as an empty cache rather than an error.
    pub async fn cache_stats(&self) -> CacheStats {
        let count = match self.store.count().await {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "tile store count failed");
                0
            }
        };
        CacheStats {
            count,
            max_tiles: self.trimmer.max_tiles(),
        }
    }

    /// Drop every cached tile.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }

    /// The store this resolver answers from.
    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::provider::{FetchError, MockFetcher};
    use crate::rng::FixedRandom;
    use crate::store::{ManualClock, MemoryTileStore, TRIM_FRACTION};

    // Smallest valid PNG header; enough for format sniffing.
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn resolver_with(
        fetcher: MockFetcher,
        max_tiles: u64,
        trim_probability: f64,
    ) -> (TileResolver<MockFetcher>, Arc<MemoryTileStore>) {
        let store = Arc::new(MemoryTileStore::new(Arc::new(ManualClock::at_epoch())));
        let dyn_store: Arc<dyn TileStore> = store.clone();
        let trimmer = Arc::new(Trimmer::new(dyn_store.clone(), max_tiles));
        let trigger = TrimTrigger::new(trim_probability, Arc::new(FixedRandom::new(0.5, 0)));
        (
            TileResolver::new(dyn_store, Arc::new(fetcher), trimmer, trigger),
            store,
        )
    }

    #[tokio::test]
    async fn test_miss_fetches_once_and_writes_back() {
        let (resolver, store) = resolver_with(MockFetcher::ok(PNG), 100, 0.0);

        let image = resolver.resolve("tile/5/10/12").await;

        assert!(image.is_ready());
        assert_eq!(resolver.fetcher.call_count(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.get("tile/5/10/12").await.unwrap().unwrap();
        assert_eq!(record.payload.as_ref(), PNG);
    }

    #[tokio::test]
    async fn test_hit_makes_no_network_call() {
        let (resolver, store) = resolver_with(MockFetcher::offline(), 100, 0.0);
        store.put("tile/5/10/12", PNG.to_vec()).await.unwrap();

        let image = resolver.resolve("tile/5/10/12").await;

        assert_eq!(image.bytes().map(|b| b.as_ref()), Some(PNG));
        assert_eq!(resolver.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_total_failure_is_unavailable_not_error() {
        let (resolver, store) = resolver_with(MockFetcher::offline(), 100, 0.0);

        let image = resolver.resolve("tile/5/10/12").await;

        assert_eq!(image, TileImage::Unavailable);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_http_error_status_is_unavailable() {
        let fetcher = MockFetcher::failing(FetchError::Status {
            status: 404,
            url: "tile/5/10/12".to_string(),
        });
        let (resolver, _) = resolver_with(fetcher, 100, 0.0);

        assert_eq!(resolver.resolve("tile/5/10/12").await, TileImage::Unavailable);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_unavailable_and_not_cached() {
        let (resolver, store) = resolver_with(MockFetcher::ok(b"<html>rate limited</html>"), 100, 0.0);

        let image = resolver.resolve("tile/5/10/12").await;

        assert_eq!(image, TileImage::Unavailable);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_hit_does_not_refresh_timestamp() {
        let clock = Arc::new(ManualClock::at_epoch());
        let store = Arc::new(MemoryTileStore::new(clock.clone()));
        let dyn_store: Arc<dyn TileStore> = store.clone();
        let trimmer = Arc::new(Trimmer::new(dyn_store.clone(), 100));
        let trigger = TrimTrigger::new(0.0, Arc::new(FixedRandom::never()));
        let resolver = TileResolver::new(
            dyn_store,
            Arc::new(MockFetcher::offline()),
            trimmer,
            trigger,
        );

        store.put("tile/1", PNG.to_vec()).await.unwrap();
        let before = store.get("tile/1").await.unwrap().unwrap().written_at;

        clock.advance(Duration::from_secs(60));
        resolver.resolve("tile/1").await;

        let after = store.get("tile/1").await.unwrap().unwrap().written_at;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_forced_trim_bounds_the_store() {
        // Probability 1.0 makes the amortized trigger deterministic.
        let (resolver, store) = resolver_with(MockFetcher::ok(PNG), 10, 1.0);

        for i in 0..12 {
            resolver.resolve(&format!("tile/{i}")).await;
            // Let the detached trim task run to completion.
            for _ in 0..20 {
                tokio::task::yield_now().await;
            }
        }

        let count = store.count().await.unwrap();
        assert!(
            count <= 10,
            "store should be back under budget after a trim cycle, got {count}"
        );
    }

    #[tokio::test]
    async fn test_trim_math_matches_fraction() {
        let (resolver, store) = resolver_with(MockFetcher::ok(PNG), 10, 0.0);

        for i in 0..11 {
            resolver.resolve(&format!("tile/{i}")).await;
        }
        assert_eq!(store.count().await.unwrap(), 11);

        let result = resolver.trimmer.trim_if_over_limit().await.unwrap().unwrap();
        let expected = (11.0 * TRIM_FRACTION).floor() as u64;
        assert_eq!(result.entries_removed, expected);
        assert_eq!(store.count().await.unwrap(), 11 - expected);
    }

    #[tokio::test]
    async fn test_stats_reflect_store_and_budget() {
        let (resolver, store) = resolver_with(MockFetcher::ok(PNG), 3000, 0.0);
        store.put("tile/1", PNG.to_vec()).await.unwrap();

        let stats = resolver.cache_stats().await;
        assert_eq!(stats.count, 1);
        assert_eq!(stats.max_tiles, 3000);
    }
}
