//! Read-only cache statistics for UI display.

use std::fmt;

use serde::Serialize;

/// Snapshot of the tile store, recomputed on each query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Records currently stored.
    pub count: u64,
    /// The tile budget the trimmer enforces.
    pub max_tiles: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} tiles cached", self.count, self.max_tiles)
    }
}
