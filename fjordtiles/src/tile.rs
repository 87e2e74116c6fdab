//! Tile payload types shared by the store, resolver and provisioner.

use std::time::SystemTime;

use bytes::Bytes;

/// The outcome of resolving a tile for rendering.
///
/// A resolve always produces one of these two values. The map widget
/// renders `Ready` bytes and draws `Unavailable` as a blank cell; it
/// never sees an error from the cache layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileImage {
    /// Renderable image bytes, from cache or network.
    Ready(Bytes),
    /// The tile could not be produced from any source.
    Unavailable,
}

impl TileImage {
    /// Whether this tile carries renderable bytes.
    pub fn is_ready(&self) -> bool {
        matches!(self, TileImage::Ready(_))
    }

    /// The image bytes, if any.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            TileImage::Ready(bytes) => Some(bytes),
            TileImage::Unavailable => None,
        }
    }
}

/// One stored tile: the unit of persistence.
///
/// `written_at` is the store-write time, not the fetch or last-access
/// time. Eviction orders by it, so cache residency favours the most
/// recently fetched tiles rather than the most recently viewed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    /// Fully-qualified tile URL; the primary key.
    pub url: String,
    /// Raw image bytes.
    pub payload: Bytes,
    /// When the record was last written.
    pub written_at: SystemTime,
}
