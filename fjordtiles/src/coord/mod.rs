//! Coordinate conversion module
//!
//! Converts geographic coordinates (latitude/longitude) to Web Mercator
//! slippy-map tile addresses and back. These are the pure functions the
//! area provisioner uses to enumerate a region.

mod types;

pub use types::{TileCoord, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Converts a longitude to a tile column at the given zoom level.
///
/// Inputs outside [`MIN_LON`]..=[`MAX_LON`] produce out-of-range columns;
/// staying in range is the caller's responsibility.
#[inline]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    ((lon + 180.0) / 360.0 * n) as u32
}

/// Converts a latitude to a tile row at the given zoom level.
///
/// Rows increase southward. Inputs outside [`MIN_LAT`]..=[`MAX_LAT`]
/// produce out-of-range rows; staying in range is the caller's
/// responsibility.
#[inline]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;
    ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32
}

/// Converts geographic coordinates to a tile address.
#[inline]
pub fn to_tile_coord(lat: f64, lon: f64, zoom: u8) -> TileCoord {
    TileCoord {
        col: lon_to_tile_x(lon, zoom),
        row: lat_to_tile_y(lat, zoom),
        zoom,
    }
}

/// Converts a tile address back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_nw_corner(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);
    let lon = tile.col as f64 / n * 360.0 - 180.0;
    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    (lat_rad * 180.0 / PI, lon)
}
