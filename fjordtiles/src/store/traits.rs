//! The tile store interface.
//!
//! `TileStore` is the capability the resolver and provisioner are handed;
//! they never open storage themselves. The trait is dyn-compatible
//! (`Pin<Box<dyn Future>>` returns) so components can hold an
//! `Arc<dyn TileStore>` and tests can swap in the in-memory store.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::tile::TileRecord;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from the persistent tile store.
///
/// Callers on the render path must treat any of these as a cache miss or
/// a no-op; a broken store degrades tiles, it never fails a render.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure while reading or writing the backing storage.
    #[error("tile store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache directory could not be used.
    #[error("invalid cache directory {path}: {reason}")]
    InvalidCacheDir { path: String, reason: String },
}

/// Persistent key/value store of tiles, keyed by tile URL.
///
/// # Semantics
///
/// - A miss is a normal outcome (`Ok(None)`), not an error.
/// - `put` upserts and refreshes the record's write timestamp; at most one
///   record exists per URL.
/// - `delete_oldest` removes records in ascending write-time order, ties
///   broken by key order, so repeated calls are deterministic.
/// - Concurrent reads and last-write-wins writes to different keys are
///   safe; racing writes to the same key are a harmless overwrite.
pub trait TileStore: Send + Sync {
    /// Look up a tile by URL.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<TileRecord>, StoreError>>;

    /// Insert or replace a tile, stamping it with the current time.
    fn put(&self, url: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Number of records currently stored.
    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>>;

    /// Remove the `n` records with the smallest write timestamps.
    ///
    /// Removing more records than exist empties the store and stops.
    /// Returns the number actually removed.
    fn delete_oldest(&self, n: u64) -> BoxFuture<'_, Result<u64, StoreError>>;

    /// Remove all records.
    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}
