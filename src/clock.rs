//! Time source for the cache and the request handler.
//!
//! Everything that measures age reads "now" through [`Clock`], so expiry,
//! window trimming and candidate selection can be driven deterministically
//! with [`ManualClock`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of monotonic "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Starts one day ahead of the real clock, so callers can freely stamp
/// references hours in the past without underflowing `Instant`.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now() + Duration::from_secs(24 * 3600))
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }

    /// Set the clock to an absolute instant (may move backwards).
    pub fn set(&self, to: Instant) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
    }

    /// `now - ago`; convenience for stamping fixtures in the past.
    pub fn ago(&self, ago: Duration) -> Instant {
        self.now() - ago
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}
