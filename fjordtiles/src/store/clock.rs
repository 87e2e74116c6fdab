//! Clock abstraction for write timestamps.
//!
//! The store stamps every write through a [`Clock`] so eviction-order
//! tests can run against a hand-cranked time source instead of wall time.

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

/// Source of write timestamps.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> SystemTime;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Testing clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// A clock frozen at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}
