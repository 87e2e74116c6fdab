//! High-level facade wiring the whole tile pipeline together.
//!
//! [`TileService`] is the one-stop entry point for the CLI and for any
//! embedding map UI: it builds the disk store, HTTP client, resolver and
//! provisioner from a [`ConfigFile`] and exposes the handful of
//! operations the application needs.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigFile;
use crate::coord::TileCoord;
use crate::prefetch::{AreaBounds, AreaProvisioner, ProvisionReport};
use crate::provider::{FetchError, HttpFetch, ReqwestFetcher, TileServer};
use crate::resolver::TileResolver;
use crate::rng::{RandomSource, ThreadRandom};
use crate::store::{
    CacheStats, DiskTileStore, StoreError, SystemClock, TileStore, TrimTrigger, Trimmer,
    TRIM_PROBABILITY,
};
use crate::tile::TileImage;

/// Errors building or operating the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The tile store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The assembled offline tile pipeline.
pub struct TileService {
    resolver: Arc<TileResolver<ReqwestFetcher>>,
    provisioner: AreaProvisioner<ReqwestFetcher>,
    server: TileServer,
    random: Arc<dyn RandomSource>,
}

impl TileService {
    /// Build the pipeline from configuration.
    pub fn new(config: &ConfigFile) -> Result<Self, ServiceError> {
        let store: Arc<dyn TileStore> = Arc::new(DiskTileStore::open(
            config.cache.directory.clone(),
            Arc::new(SystemClock),
        )?);
        let fetcher = Arc::new(ReqwestFetcher::with_timeout(config.network.timeout_secs)?);
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);

        let trimmer = Arc::new(Trimmer::new(Arc::clone(&store), config.cache.max_tiles));
        let trigger = TrimTrigger::new(TRIM_PROBABILITY, Arc::clone(&random));
        let resolver = Arc::new(TileResolver::new(store, fetcher, Arc::clone(&trimmer), trigger));

        let server = TileServer::new(
            config.network.url_template.clone(),
            config.network.shards.clone(),
        );
        let provisioner = AreaProvisioner::new(
            Arc::clone(&resolver),
            server.clone(),
            Arc::clone(&random),
            Duration::from_millis(config.provision.throttle_ms),
            trimmer,
        );

        Ok(Self {
            resolver,
            provisioner,
            server,
            random,
        })
    }

    /// Resolve a fully-qualified tile URL, cache first.
    pub async fn resolve_url(&self, url: &str) -> TileImage {
        self.resolver.resolve(url).await
    }

    /// Resolve a tile address, building its URL with a random shard.
    pub async fn resolve_tile(&self, tile: &TileCoord) -> TileImage {
        let url = self.server.tile_url(tile, self.random.as_ref());
        self.resolver.resolve(&url).await
    }

    /// Download an area for offline use. See
    /// [`AreaProvisioner::provision`].
    pub async fn provision<F>(
        &self,
        bounds: AreaBounds,
        zoom_min: u8,
        zoom_max: u8,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ProvisionReport
    where
        F: FnMut(u64, u64),
    {
        self.provisioner
            .provision(bounds, zoom_min, zoom_max, cancel, on_progress)
            .await
    }

    /// Cache statistics for display.
    pub async fn stats(&self) -> CacheStats {
        self.resolver.cache_stats().await
    }

    /// Remove every cached tile.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.resolver.clear().await
    }
}
