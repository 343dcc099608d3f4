//! A fetched price bound to its identifier and fetch time.

use std::time::{Duration, Instant};

use super::{Identifier, Rate};

/// A price returned by the oracle and the instant it was fetched.
///
/// Immutable once constructed. References returned from one oracle call
/// all share the same `fetched_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub identifier: Identifier,
    pub rate: Rate,
    pub fetched_at: Instant,
}

impl Reference {
    /// Create a new reference.
    pub fn new(identifier: Identifier, rate: impl Into<Rate>, fetched_at: Instant) -> Self {
        Self {
            identifier,
            rate: rate.into(),
            fetched_at,
        }
    }

    /// Age of this reference at `now`. Zero if `fetched_at` is after `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}
