//! Expiring key-value storage for cached references.
//!
//! The [`ReferenceCache`](super::ReferenceCache) only needs get and
//! put-with-TTL, expressed by [`ExpiringStore`]. Two backends ship:
//!
//! - [`MokaStore`]: moka's bounded in-memory cache with per-entry expiry.
//!   The production default.
//! - [`MemoryStore`]: a plain map whose expiry is measured against a
//!   [`Clock`]. Useful when time must be controlled, e.g. with
//!   [`ManualClock`](crate::clock::ManualClock).
//!
//! A TTL of zero means "already stale": the entry is removed instead of
//! written, so a late write can never extend an older entry's life.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use crate::Result;
use crate::clock::Clock;
use crate::types::Reference;

/// Backend holding cached references under their string key.
///
/// Implementations must be safe for concurrent individual calls. Errors are
/// propagated to the cache's caller unchanged.
pub trait ExpiringStore: Send + Sync {
    /// Look up a live entry.
    fn get(&self, key: &str) -> Result<Option<Reference>>;

    /// Write (or overwrite) an entry that expires after `ttl`.
    ///
    /// `ttl == Duration::ZERO` must leave no live entry under `key`.
    fn put(&self, key: &str, reference: Reference, ttl: Duration) -> Result<()>;
}

/// Default maximum number of entries in a [`MokaStore`].
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Clone, Debug)]
struct StoredReference {
    reference: Reference,
    ttl: Duration,
}

/// Per-entry expiry: every write carries its own TTL.
struct ReferenceExpiry;

impl Expiry<String, StoredReference> for ReferenceExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredReference,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredReference,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-backed store. Bounded LRU with per-entry TTL.
pub struct MokaStore {
    entries: Cache<String, StoredReference>,
}

impl MokaStore {
    /// Create a store with the default capacity (10,000).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max)
            .expire_after(ReferenceExpiry)
            .build();
        Self { entries }
    }

    /// Number of entries currently held (approximate, see moka docs).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpiringStore for MokaStore {
    fn get(&self, key: &str) -> Result<Option<Reference>> {
        Ok(self.entries.get(key).map(|stored| stored.reference))
    }

    fn put(&self, key: &str, reference: Reference, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            self.entries.invalidate(key);
        } else {
            self.entries
                .insert(key.to_owned(), StoredReference { reference, ttl });
        }
        Ok(())
    }
}

/// Map-backed store whose expiry follows an injected [`Clock`].
///
/// Meant for deterministic-time tests and small embedded use. It is
/// unbounded: expired entries are only dropped when their key is read or
/// written again, so use [`MokaStore`] for long-running processes. A TTL too
/// large to add to the clock's `now` never expires.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (Reference, Option<Instant>)>>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpiringStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Reference>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
            match entries.get(key) {
                None => return Ok(None),
                Some((reference, expires_at)) if is_live(*expires_at, now) => {
                    return Ok(Some(reference.clone()));
                }
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if entries
            .get(key)
            .is_some_and(|(_, expires_at)| !is_live(*expires_at, now))
        {
            entries.remove(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, reference: Reference, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if ttl.is_zero() {
            entries.remove(key);
        } else {
            let expires_at = self.clock.now().checked_add(ttl);
            entries.insert(key.to_owned(), (reference, expires_at));
        }
        Ok(())
    }
}

fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_none_or(|at| now < at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Identifier;

    fn reference(rate: &str) -> Reference {
        Reference::new(
            Identifier::new("Summer", "FloatingPointResort", "SingletonRoom"),
            rate,
            Instant::now(),
        )
    }

    #[test]
    fn moka_put_then_get() {
        let store = MokaStore::new();
        store
            .put("k", reference("12000"), Duration::from_secs(60))
            .unwrap();

        let found = store.get("k").unwrap().expect("entry should be live");
        assert_eq!(found.rate.as_str(), "12000");
        assert!(store.get("other").unwrap().is_none());
    }

    #[test]
    fn moka_ttl_expiry() {
        let store = MokaStore::new();
        store
            .put("k", reference("12000"), Duration::from_millis(10))
            .unwrap();

        std::thread::sleep(Duration::from_millis(50));

        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn moka_zero_ttl_removes_existing_entry() {
        let store = MokaStore::new();
        store
            .put("k", reference("12000"), Duration::from_secs(60))
            .unwrap();
        store
            .put("k", reference("14000"), Duration::ZERO)
            .unwrap();

        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn moka_overwrite_takes_new_ttl() {
        let store = MokaStore::new();
        store
            .put("k", reference("12000"), Duration::from_secs(60))
            .unwrap();
        store
            .put("k", reference("14000"), Duration::from_millis(10))
            .unwrap();

        assert_eq!(store.get("k").unwrap().unwrap().rate.as_str(), "14000");
        std::thread::sleep(Duration::from_millis(50));
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn memory_store_follows_clock() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::new(clock.clone());
        store
            .put("k", reference("12000"), Duration::from_secs(300))
            .unwrap();

        clock.advance(Duration::from_secs(299));
        assert!(store.get("k").unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get("k").unwrap().is_none());
        assert!(store.is_empty(), "expired entry dropped on read");
    }

    #[test]
    fn memory_store_zero_ttl_removes() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::new(clock);
        store
            .put("k", reference("12000"), Duration::from_secs(300))
            .unwrap();
        store.put("k", reference("12000"), Duration::ZERO).unwrap();

        assert!(store.get("k").unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn memory_store_huge_ttl_never_expires() {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::new(clock.clone());
        store.put("k", reference("12000"), Duration::MAX).unwrap();

        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(store.get("k").unwrap().unwrap().rate.as_str(), "12000");
    }
}
