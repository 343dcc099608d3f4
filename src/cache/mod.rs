//! Reference cache with refresh-candidate selection.
//!
//! [`ReferenceCache`] is the thread-safe façade over two pieces:
//!
//! - an [`ExpiringStore`] holding the cached references themselves
//!   (the cache of record, keyed on [`Identifier::cache_key()`]);
//! - a [`ReferenceWindow`] remembering recent fetches, consulted on a miss
//!   to pick other identifiers worth refreshing in the same oracle call.
//!
//! # Locking
//!
//! The window is not synchronized. A single mutex owned by the cache guards
//! it, and every operation holds that mutex across its store access too:
//! a lookup reads the store and the window under one critical section, and
//! a store writes the whole batch to both under one critical section, so a
//! lookup never observes a half-applied batch. No I/O happens under the
//! lock; the oracle is called by the caller, between a miss and the
//! following [`store()`](ReferenceCache::store).

pub mod store;
pub mod window;

pub use store::{ExpiringStore, MemoryStore, MokaStore};
pub use window::ReferenceWindow;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::telemetry;
use crate::types::{Identifier, Reference};
use crate::{MuninnError, Result};

/// Configuration for the reference cache.
///
/// ```rust
/// # use muninn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .cache_duration(Duration::from_secs(300))
///     .max_batch_size(10);
/// assert_eq!(config.effective_refresh_candidate_age(), Duration::from_secs(150));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched price stays servable. Default: 5 minutes.
    pub cache_duration: Duration,
    /// Age at which an identifier becomes a refresh candidate.
    /// `None` means half of `cache_duration`.
    pub refresh_candidate_age: Option<Duration>,
    /// How long the window retains an entry. Default: 30 minutes.
    pub max_age: Duration,
    /// Most identifiers sent in one oracle call, target included. Default: 10.
    pub max_batch_size: usize,
    /// Capacity of the default moka store. Default: 10,000.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs(5 * 60),
            refresh_candidate_age: None,
            max_age: Duration::from_secs(30 * 60),
            max_batch_size: 10,
            max_entries: store::DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how long a fetched price stays servable.
    pub fn cache_duration(mut self, d: Duration) -> Self {
        self.cache_duration = d;
        self
    }

    /// Set the staleness at which identifiers become refresh candidates.
    pub fn refresh_candidate_age(mut self, d: Duration) -> Self {
        self.refresh_candidate_age = Some(d);
        self
    }

    /// Set the window retention.
    pub fn max_age(mut self, d: Duration) -> Self {
        self.max_age = d;
        self
    }

    /// Set the largest oracle batch, target included.
    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.max_batch_size = n;
        self
    }

    /// Set the capacity of the default store.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// The refresh-candidate age after applying the default.
    pub fn effective_refresh_candidate_age(&self) -> Duration {
        self.refresh_candidate_age.unwrap_or(self.cache_duration / 2)
    }

    /// Reject configurations the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(MuninnError::Configuration(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of [`ReferenceCache::lookup_or_select_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The store holds a live reference.
    Hit(Reference),
    /// Nothing cached. Identifiers to request from the oracle: the target
    /// first, then window-derived refresh candidates.
    ///
    /// The target is not deduplicated against the candidates; if the window
    /// independently proposes it, it appears twice.
    Miss(Vec<Identifier>),
}

impl Lookup {
    /// Split into `(reference, candidates)`; candidates are empty on a hit.
    pub fn into_parts(self) -> (Option<Reference>, Vec<Identifier>) {
        match self {
            Lookup::Hit(reference) => (Some(reference), Vec::new()),
            Lookup::Miss(candidates) => (None, candidates),
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

/// Thread-safe reference cache.
///
/// Construct once at start-up and share (e.g. in an `Arc`) across request
/// handlers. See the module docs for the locking discipline.
pub struct ReferenceCache {
    config: CacheConfig,
    store: Arc<dyn ExpiringStore>,
    clock: Arc<dyn Clock>,
    window: Mutex<ReferenceWindow>,
}

impl ReferenceCache {
    /// Create a cache backed by a [`MokaStore`] and the system clock.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let store = Arc::new(MokaStore::with_max_entries(config.max_entries));
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    /// Create a cache over an explicit store and clock.
    ///
    /// The store's notion of expiry should follow the same clock.
    pub fn with_store(
        config: CacheConfig,
        store: Arc<dyn ExpiringStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let window =
            ReferenceWindow::new(config.max_age, config.effective_refresh_candidate_age());
        Ok(Self {
            config,
            store,
            clock,
            window: Mutex::new(window),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// "Now" according to the cache's clock. Callers stamping fetch times
    /// for [`store()`](Self::store) should use this.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Return the cached reference for `identifier`, or, on a miss, the
    /// identifiers to fetch: `identifier` first, then up to
    /// `max_batch_size - 1` refresh candidates.
    ///
    /// Store errors propagate unchanged.
    pub fn lookup_or_select_candidates(&self, identifier: &Identifier) -> Result<Lookup> {
        let window = self.lock_window();

        if let Some(reference) = self.store.get(&identifier.cache_key())? {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
            return Ok(Lookup::Hit(reference));
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        let extra = window.refresh_candidates(
            self.config.max_batch_size.saturating_sub(1),
            self.clock.now(),
        );
        metrics::histogram!(telemetry::REFRESH_CANDIDATES).record(extra.len() as f64);
        debug!(%identifier, candidates = extra.len(), "cache miss");

        let mut candidates = Vec::with_capacity(extra.len() + 1);
        candidates.push(identifier.clone());
        candidates.extend(extra);
        Ok(Lookup::Miss(candidates))
    }

    /// Record `references` in the window and write them to the store, in order.
    ///
    /// Each entry's TTL is `cache_duration` minus its age, so a reference
    /// that went stale while the oracle call was in flight is not served.
    /// References must be in non-decreasing `fetched_at` order relative to
    /// everything stored before.
    pub fn store(&self, references: &[Reference]) -> Result<()> {
        let mut window = self.lock_window();
        let now = self.clock.now();

        for reference in references {
            window.add(reference.clone(), now);
            let ttl = self
                .config
                .cache_duration
                .saturating_sub(reference.age_at(now));
            self.store
                .put(&reference.identifier.cache_key(), reference.clone(), ttl)?;
        }
        debug!(count = references.len(), window = window.len(), "stored references");
        Ok(())
    }

    /// Lock the window, recovering from poisoning: the window holds no
    /// invariant a panicking reader could have broken halfway.
    fn lock_window(&self) -> MutexGuard<'_, ReferenceWindow> {
        self.window.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_duration, Duration::from_secs(300));
        assert_eq!(config.effective_refresh_candidate_age(), Duration::from_secs(150));
        assert_eq!(config.max_age, Duration::from_secs(1800));
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.max_entries, 10_000);
    }

    #[test]
    fn config_builder_pattern() {
        let config = CacheConfig::new()
            .cache_duration(Duration::from_secs(60))
            .refresh_candidate_age(Duration::from_secs(10))
            .max_age(Duration::from_secs(600))
            .max_batch_size(4)
            .max_entries(50);
        assert_eq!(config.cache_duration, Duration::from_secs(60));
        assert_eq!(config.effective_refresh_candidate_age(), Duration::from_secs(10));
        assert_eq!(config.max_age, Duration::from_secs(600));
        assert_eq!(config.max_batch_size, 4);
        assert_eq!(config.max_entries, 50);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let result = ReferenceCache::new(CacheConfig::new().max_batch_size(0));
        assert!(matches!(result, Err(MuninnError::Configuration(_))));
    }

    #[test]
    fn lookup_into_parts() {
        let id = Identifier::new("Summer", "GitawayHotel", "BooleanTwin");
        let (reference, candidates) = Lookup::Miss(vec![id.clone()]).into_parts();
        assert!(reference.is_none());
        assert_eq!(candidates, vec![id]);
    }
}
