//! Bulk provisioning of an area for offline use.
//!
//! Before a field trip the operator downloads every tile covering their
//! sites across a zoom range. [`enumerate_tiles`] turns a bounding box
//! into the exact tile rectangle per zoom level; [`AreaProvisioner`]
//! walks that list through the resolver at a throttled rate, reporting
//! progress per tile and tolerating per-tile failures.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{lat_to_tile_y, lon_to_tile_x, TileCoord};
use crate::provider::{HttpFetch, TileServer};
use crate::resolver::TileResolver;
use crate::rng::RandomSource;
use crate::store::Trimmer;
use crate::tile::TileImage;

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl AreaBounds {
    /// A bounding box from its four edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }
}

/// The tile rectangle an area covers at one zoom level.
///
/// North maps to the smaller row because tile rows grow southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_col: u32,
    pub max_col: u32,
    pub min_row: u32,
    pub max_row: u32,
    pub zoom: u8,
}

impl TileRect {
    /// Number of tiles in the rectangle.
    pub fn tile_count(&self) -> u64 {
        let cols = (self.max_col - self.min_col + 1) as u64;
        let rows = (self.max_row - self.min_row + 1) as u64;
        cols * rows
    }
}

/// The tile rectangle covering `bounds` at `zoom`.
pub fn tile_rect(bounds: AreaBounds, zoom: u8) -> TileRect {
    TileRect {
        min_col: lon_to_tile_x(bounds.west, zoom),
        max_col: lon_to_tile_x(bounds.east, zoom),
        min_row: lat_to_tile_y(bounds.north, zoom),
        max_row: lat_to_tile_y(bounds.south, zoom),
        zoom,
    }
}

/// Every tile covering `bounds` from `zoom_min` through `zoom_max`.
pub fn enumerate_tiles(bounds: AreaBounds, zoom_min: u8, zoom_max: u8) -> Vec<TileCoord> {
    let mut tiles = Vec::new();
    for zoom in zoom_min..=zoom_max {
        let rect = tile_rect(bounds, zoom);
        for col in rect.min_col..=rect.max_col {
            for row in rect.min_row..=rect.max_row {
                tiles.push(TileCoord::new(col, row, zoom));
            }
        }
    }
    tiles
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// Tiles the run got to before finishing or being cancelled.
    pub attempted: u64,
    /// Tiles that resolved to an image (fresh or already cached).
    pub succeeded: u64,
    /// Tiles that stayed unavailable.
    pub failed: u64,
    /// Tiles the area enumerates to in total.
    pub total: u64,
}

/// Downloads every tile in an area through the resolver.
pub struct AreaProvisioner<H> {
    resolver: Arc<TileResolver<H>>,
    server: TileServer,
    random: Arc<dyn RandomSource>,
    throttle: Duration,
    trimmer: Arc<Trimmer>,
}

impl<H: HttpFetch> AreaProvisioner<H> {
    /// A provisioner driving `resolver` against `server`.
    pub fn new(
        resolver: Arc<TileResolver<H>>,
        server: TileServer,
        random: Arc<dyn RandomSource>,
        throttle: Duration,
        trimmer: Arc<Trimmer>,
    ) -> Self {
        Self {
            resolver,
            server,
            random,
            throttle,
            trimmer,
        }
    }

    /// Download all tiles covering `bounds` for `zoom_min..=zoom_max`.
    ///
    /// Per-tile failures are logged and skipped; the batch never aborts.
    /// `on_progress(done, total)` fires after every tile regardless of
    /// outcome. `cancel` is checked between tiles; already-cached tiles
    /// stay cached when a run is abandoned. One unconditional trim pass
    /// runs at the end, since bulk downloads are the likeliest way to
    /// breach the budget.
    pub async fn provision<F>(
        &self,
        bounds: AreaBounds,
        zoom_min: u8,
        zoom_max: u8,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> ProvisionReport
    where
        F: FnMut(u64, u64),
    {
        let tiles = enumerate_tiles(bounds, zoom_min, zoom_max);
        let mut report = ProvisionReport {
            total: tiles.len() as u64,
            ..Default::default()
        };

        info!(
            total = report.total,
            zoom_min,
            zoom_max,
            north = bounds.north,
            south = bounds.south,
            east = bounds.east,
            west = bounds.west,
            "provisioning area for offline use"
        );

        for tile in tiles {
            if cancel.is_cancelled() {
                info!(
                    attempted = report.attempted,
                    total = report.total,
                    "area provisioning cancelled"
                );
                break;
            }

            let url = self.server.tile_url(&tile, self.random.as_ref());
            match self.resolver.resolve(&url).await {
                TileImage::Ready(_) => report.succeeded += 1,
                TileImage::Unavailable => {
                    warn!(tile = %tile, url, "tile download failed, skipping");
                    report.failed += 1;
                }
            }

            report.attempted += 1;
            on_progress(report.attempted, report.total);

            if !self.throttle.is_zero() {
                tokio::time::sleep(self.throttle).await;
            }
        }

        match self.trimmer.trim_if_over_limit().await {
            Ok(Some(result)) => info!(%result, "post-provision trim"),
            Ok(None) => debug!("post-provision trim not needed"),
            Err(error) => warn!(%error, "post-provision trim failed"),
        }

        report
    }
}
