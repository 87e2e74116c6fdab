//! FjordTiles - Offline map tiles for salmon-farm field work
//!
//! This library keeps a persistent, size-bounded cache of raster map tiles
//! so the site map stays usable on a boat with no signal. Tiles are served
//! cache-first, refilled from the tile server when the network is up, and
//! whole areas can be provisioned ahead of a trip.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use fjordtiles::config::ConfigFile;
//! use fjordtiles::prefetch::AreaBounds;
//! use fjordtiles::service::TileService;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ConfigFile::load().unwrap_or_default();
//! let service = TileService::new(&config)?;
//!
//! // Download an area around a site for offline use
//! let bounds = AreaBounds::new(63.75, 63.60, 8.85, 8.45);
//! let cancel = CancellationToken::new();
//! let report = service
//!     .provision(bounds, 10, 14, &cancel, |done, total| {
//!         println!("{done}/{total}");
//!     })
//!     .await;
//! ```

pub mod config;
pub mod coord;
pub mod logging;
pub mod prefetch;
pub mod provider;
pub mod resolver;
pub mod rng;
pub mod service;
pub mod store;
pub mod tile;
