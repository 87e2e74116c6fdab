//! Tile server URL building.
//!
//! Tile servers publish interchangeable shard hosts (`a.tile...`,
//! `b.tile...`) so bulk clients spread load and dodge per-host connection
//! limits. [`TileServer`] expands a `{s}/{z}/{x}/{y}` template, picking
//! the shard through the injected random source.

use crate::coord::TileCoord;
use crate::rng::RandomSource;

/// Default OpenStreetMap raster tile template.
pub const DEFAULT_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Default shard subdomains.
pub const DEFAULT_SHARDS: [&str; 3] = ["a", "b", "c"];

/// A raster tile server described by a URL template and its shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileServer {
    url_template: String,
    shards: Vec<String>,
}

impl TileServer {
    /// A server from a template and shard list.
    ///
    /// Templates without a `{s}` placeholder work with an empty shard
    /// list.
    pub fn new(url_template: impl Into<String>, shards: Vec<String>) -> Self {
        Self {
            url_template: url_template.into(),
            shards,
        }
    }

    /// The URL for `tile` on a specific shard.
    pub fn url_for_shard(&self, tile: &TileCoord, shard: &str) -> String {
        self.url_template
            .replace("{s}", shard)
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.col.to_string())
            .replace("{y}", &tile.row.to_string())
    }

    /// The URL for `tile`, with the shard drawn from `random`.
    pub fn tile_url(&self, tile: &TileCoord, random: &dyn RandomSource) -> String {
        let shard = if self.shards.is_empty() {
            ""
        } else {
            self.shards[random.pick_index(self.shards.len())].as_str()
        };
        self.url_for_shard(tile, shard)
    }
}

impl Default for TileServer {
    fn default() -> Self {
        Self::new(
            DEFAULT_URL_TEMPLATE,
            DEFAULT_SHARDS.iter().map(|s| s.to_string()).collect(),
        )
    }
}
