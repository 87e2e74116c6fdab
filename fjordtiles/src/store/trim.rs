//! Cache trimming.
//!
//! The store is allowed to drift over its tile budget between trims; what
//! bounds it is an amortized check. Each successful cache write rolls a
//! [`TrimTrigger`] with a low fixed probability, and a firing trigger
//! spawns a detached [`Trimmer`] pass. The pass deletes a fixed fraction
//! of the oldest entries rather than trimming to the exact limit, which
//! leaves headroom and keeps trims rare.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::traits::{StoreError, TileStore};
use crate::rng::RandomSource;

/// Default tile budget for the store.
pub const DEFAULT_MAX_TILES: u64 = 3000;

/// Fraction of entries a trim pass deletes, oldest first.
pub const TRIM_FRACTION: f64 = 0.2;

/// Probability that a cache write triggers a trim pass (1 in 100).
pub const TRIM_PROBABILITY: f64 = 0.01;

/// Result of a trim pass that did work.
#[derive(Debug, Clone, Default)]
pub struct TrimResult {
    /// Number of records removed.
    pub entries_removed: u64,
    /// Record count before the pass.
    pub count_before: u64,
    /// Record count after the pass.
    pub count_after: u64,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for TrimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trim: removed {} tiles ({} -> {}) in {}ms",
            self.entries_removed, self.count_before, self.count_after, self.duration_ms
        )
    }
}

/// Deletes the oldest fifth of the store when it is over budget.
pub struct Trimmer {
    store: Arc<dyn TileStore>,
    max_tiles: u64,
}

impl Trimmer {
    /// A trimmer enforcing `max_tiles` on `store`.
    pub fn new(store: Arc<dyn TileStore>, max_tiles: u64) -> Self {
        Self { store, max_tiles }
    }

    /// The tile budget this trimmer enforces.
    pub fn max_tiles(&self) -> u64 {
        self.max_tiles
    }

    /// Check the store size and trim if it exceeds the budget.
    ///
    /// Returns `Ok(None)` when the store is under budget. The store may
    /// shrink or grow concurrently; deleting a record that is already
    /// gone is a no-op.
    pub async fn trim_if_over_limit(&self) -> Result<Option<TrimResult>, StoreError> {
        let start = Instant::now();
        let count_before = self.store.count().await?;

        if count_before <= self.max_tiles {
            debug!(
                count = count_before,
                max_tiles = self.max_tiles,
                "tile store under budget, no trim needed"
            );
            return Ok(None);
        }

        let to_delete = (count_before as f64 * TRIM_FRACTION).floor() as u64;
        let entries_removed = self.store.delete_oldest(to_delete).await?;

        Ok(Some(TrimResult {
            entries_removed,
            count_before,
            count_after: count_before - entries_removed,
            duration_ms: start.elapsed().as_millis() as u64,
        }))
    }
}

/// Spawn a detached trim pass.
///
/// The resolver calls this so a trim never gates a tile render. Failures
/// are logged and dropped; the next triggered write retries.
pub fn spawn_trim(trimmer: Arc<Trimmer>) {
    tokio::spawn(async move {
        match trimmer.trim_if_over_limit().await {
            Ok(Some(result)) => info!(%result, "tile cache trimmed"),
            Ok(None) => {}
            Err(error) => warn!(%error, "tile cache trim failed"),
        }
    });
}

/// Probabilistic trigger rolled on each cache write.
#[derive(Clone)]
pub struct TrimTrigger {
    probability: f64,
    random: Arc<dyn RandomSource>,
}

impl TrimTrigger {
    /// A trigger firing with the given probability per roll.
    ///
    /// Probability 1.0 fires every time, which is how tests pin the
    /// behaviour down.
    pub fn new(probability: f64, random: Arc<dyn RandomSource>) -> Self {
        Self {
            probability,
            random,
        }
    }

    /// Roll the trigger.
    pub fn should_run(&self) -> bool {
        self.random.next_f64() < self.probability
    }
}
