//! Tests for the reference cache façade.
//!
//! Time is driven by a `ManualClock` shared between the cache and a
//! `MemoryStore`, so expiry and candidate selection are deterministic.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use muninn::cache::{MemoryStore, MokaStore};
use muninn::clock::{Clock, ManualClock};
use muninn::telemetry;
use muninn::{CacheConfig, Identifier, Lookup, MuninnError, Reference, ReferenceCache};

const MINUTE: Duration = Duration::from_secs(60);

fn id(room: &str) -> Identifier {
    Identifier::new("Summer", "FloatingPointResort", room)
}

fn setup(config: CacheConfig) -> (ReferenceCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let cache = ReferenceCache::with_store(config, store, clock.clone()).unwrap();
    (cache, clock)
}

fn expect_miss(lookup: Lookup) -> Vec<Identifier> {
    match lookup {
        Lookup::Miss(candidates) => candidates,
        Lookup::Hit(reference) => panic!("expected a miss, got {reference:?}"),
    }
}

// ============================================================================
// Hits and misses
// ============================================================================

#[test]
fn empty_cache_misses_with_target_only() {
    let (cache, _clock) = setup(CacheConfig::default());

    let candidates = expect_miss(cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap());
    assert_eq!(candidates, vec![id("BooleanTwin")]);
}

#[test]
fn stored_reference_is_served() {
    let (cache, clock) = setup(CacheConfig::default());
    cache
        .store(&[Reference::new(id("BooleanTwin"), "12000", clock.now())])
        .unwrap();

    match cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap() {
        Lookup::Hit(reference) => {
            assert_eq!(reference.identifier, id("BooleanTwin"));
            assert_eq!(reference.rate.as_str(), "12000");
        }
        Lookup::Miss(c) => panic!("expected a hit, got miss with {c:?}"),
    }
}

#[test]
fn reference_expires_after_cache_duration() {
    let (cache, clock) = setup(CacheConfig::new().cache_duration(5 * MINUTE));
    cache
        .store(&[Reference::new(id("RestfulKing"), "15000", clock.now())])
        .unwrap();

    clock.advance(5 * MINUTE - Duration::from_secs(1));
    assert!(cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());

    clock.advance(Duration::from_secs(1));
    assert!(!cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
}

#[test]
fn ttl_is_shortened_by_age_at_store_time() {
    let (cache, clock) = setup(CacheConfig::new().cache_duration(5 * MINUTE));
    cache
        .store(&[Reference::new(id("RestfulKing"), "15000", clock.ago(4 * MINUTE))])
        .unwrap();

    assert!(cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
    clock.advance(MINUTE);
    assert!(!cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
}

#[test]
fn stale_reference_is_not_served() {
    let (cache, clock) = setup(CacheConfig::new().cache_duration(5 * MINUTE));
    cache
        .store(&[Reference::new(id("RestfulKing"), "15000", clock.ago(6 * MINUTE))])
        .unwrap();

    assert!(!cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
}

#[test]
fn stale_write_drops_live_entry() {
    let (cache, clock) = setup(CacheConfig::new().cache_duration(5 * MINUTE));
    cache
        .store(&[Reference::new(id("RestfulKing"), "15000", clock.now())])
        .unwrap();
    cache
        .store(&[Reference::new(id("RestfulKing"), "16000", clock.ago(10 * MINUTE))])
        .unwrap();

    assert!(!cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
}

#[test]
fn later_store_overwrites_rate() {
    let (cache, clock) = setup(CacheConfig::default());
    cache
        .store(&[Reference::new(id("BooleanTwin"), "12000", clock.now())])
        .unwrap();
    clock.advance(MINUTE);
    cache
        .store(&[Reference::new(id("BooleanTwin"), "13000", clock.now())])
        .unwrap();

    let (reference, _) = cache
        .lookup_or_select_candidates(&id("BooleanTwin"))
        .unwrap()
        .into_parts();
    assert_eq!(reference.unwrap().rate.as_str(), "13000");
}

// ============================================================================
// Refresh candidates
// ============================================================================

/// Stores SingletonRoom, BooleanTwin, SingletonRoom, RestfulKing and
/// SingletonRoom fetched 9, 7, 6, 4 and 2 minutes ago.
fn seeded(max_batch_size: usize) -> (ReferenceCache, Arc<ManualClock>) {
    let config = CacheConfig::new()
        .cache_duration(10 * MINUTE)
        .max_age(10 * MINUTE)
        .max_batch_size(max_batch_size);
    let (cache, clock) = setup(config);
    cache
        .store(&[
            Reference::new(id("SingletonRoom"), "10000", clock.ago(9 * MINUTE)),
            Reference::new(id("BooleanTwin"), "12000", clock.ago(7 * MINUTE)),
            Reference::new(id("SingletonRoom"), "10500", clock.ago(6 * MINUTE)),
            Reference::new(id("RestfulKing"), "15000", clock.ago(4 * MINUTE)),
            Reference::new(id("SingletonRoom"), "11000", clock.ago(2 * MINUTE)),
        ])
        .unwrap();
    (cache, clock)
}

#[test]
fn miss_piggybacks_stale_identifiers() {
    let (cache, clock) = seeded(10);
    clock.advance(2 * MINUTE);

    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(
        candidates,
        vec![target, id("RestfulKing"), id("BooleanTwin")]
    );
}

#[test]
fn fresh_identifier_is_still_a_hit() {
    let (cache, clock) = seeded(10);
    clock.advance(2 * MINUTE);

    let (reference, _) = cache
        .lookup_or_select_candidates(&id("SingletonRoom"))
        .unwrap()
        .into_parts();
    assert_eq!(reference.unwrap().rate.as_str(), "11000");
}

#[test]
fn candidates_are_bounded_by_batch_size() {
    let (cache, clock) = seeded(2);
    clock.advance(2 * MINUTE);

    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(candidates, vec![target, id("RestfulKing")]);
}

#[test]
fn batch_size_one_sends_target_alone() {
    let (cache, clock) = seeded(1);
    clock.advance(5 * MINUTE);

    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(candidates, vec![target]);
}

#[test]
fn target_may_also_appear_as_candidate() {
    let (cache, clock) = seeded(10);
    clock.advance(3 * MINUTE);
    let other = Identifier::new("Winter", "GitawayHotel", "RestfulKing");
    cache
        .store(&[Reference::new(other, "18000", clock.now())])
        .unwrap();

    // BooleanTwin has just expired from the store but is still in the window.
    let candidates = expect_miss(cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap());

    assert_eq!(
        candidates,
        vec![
            id("BooleanTwin"),
            id("SingletonRoom"),
            id("RestfulKing"),
            id("BooleanTwin"),
        ]
    );
}

#[test]
fn idle_window_proposes_nothing() {
    let (cache, clock) = seeded(10);
    clock.advance(5 * MINUTE);

    // Every entry is past the threshold, so there is no boundary.
    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(candidates, vec![target]);
}

#[test]
fn storing_trims_the_window() {
    let (cache, clock) = seeded(10);
    clock.advance(3 * MINUTE + Duration::from_secs(30));
    cache
        .store(&[Reference::new(id("SingletonRoom"), "11500", clock.now())])
        .unwrap();

    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(candidates, vec![target, id("RestfulKing")]);
}

#[test]
fn refreshed_identifier_is_no_longer_a_candidate() {
    let (cache, clock) = seeded(10);
    clock.advance(2 * MINUTE);
    cache
        .store(&[Reference::new(id("RestfulKing"), "15500", clock.now())])
        .unwrap();

    let target = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
    let candidates = expect_miss(cache.lookup_or_select_candidates(&target).unwrap());

    assert_eq!(candidates, vec![target, id("BooleanTwin")]);
}

// ============================================================================
// Construction and concurrency
// ============================================================================

#[test]
fn zero_batch_size_is_a_configuration_error() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let result = ReferenceCache::with_store(CacheConfig::new().max_batch_size(0), store, clock);
    assert!(matches!(result, Err(MuninnError::Configuration(_))));
}

#[test]
fn default_cache_uses_moka_and_system_clock() {
    let cache = ReferenceCache::new(CacheConfig::default()).unwrap();
    cache
        .store(&[Reference::new(id("BooleanTwin"), "12000", cache.now())])
        .unwrap();
    assert!(cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap().is_hit());
}

#[test]
fn moka_store_backs_cache_with_manual_clock_stamps() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(MokaStore::new());
    let cache = ReferenceCache::with_store(CacheConfig::default(), store.clone(), clock.clone())
        .unwrap();

    cache
        .store(&[
            Reference::new(id("BooleanTwin"), "12000", clock.now()),
            Reference::new(id("RestfulKing"), "15000", clock.ago(10 * MINUTE)),
        ])
        .unwrap();

    assert!(cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap().is_hit());
    assert!(!cache.lookup_or_select_candidates(&id("RestfulKing")).unwrap().is_hit());
}

#[test]
fn concurrent_lookups_and_stores() {
    let cache = Arc::new(ReferenceCache::new(CacheConfig::default()).unwrap());
    let rooms = ["SingletonRoom", "BooleanTwin", "RestfulKing"];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for j in 0..50 {
                    let target = id(rooms[(i + j) % rooms.len()]);
                    let Lookup::Miss(batch) = cache.lookup_or_select_candidates(&target).unwrap()
                    else {
                        continue;
                    };
                    assert_eq!(batch[0], target);
                    assert!(batch.len() <= cache.config().max_batch_size);
                    let now = cache.now();
                    let refs: Vec<_> = batch
                        .into_iter()
                        .map(|id| Reference::new(id, "12000", now))
                        .collect();
                    cache.store(&refs).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for room in rooms {
        assert!(cache.lookup_or_select_candidates(&id(room)).unwrap().is_hit());
    }
}

// ============================================================================
// Metrics
// ============================================================================

fn counter_total(
    snapshot: &[(
        metrics_util::CompositeKey,
        Option<metrics::Unit>,
        Option<metrics::SharedString>,
        DebugValue,
    )],
    name: &str,
) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

#[test]
fn lookups_record_hit_and_miss_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let (cache, clock) = setup(CacheConfig::default());
        cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap();
        cache
            .store(&[Reference::new(id("BooleanTwin"), "12000", clock.now())])
            .unwrap();
        cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap();
        cache.lookup_or_select_candidates(&id("BooleanTwin")).unwrap();
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 2);
    assert!(
        snapshot.iter().any(|(key, _, _, _)| key.kind() == MetricKind::Histogram
            && key.key().name() == telemetry::REFRESH_CANDIDATES),
        "expected a refresh-candidates histogram entry"
    );
}

#[test]
fn window_trimming_records_evictions() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let (cache, clock) = seeded(10);
        clock.advance(3 * MINUTE + Duration::from_secs(30));
        cache
            .store(&[Reference::new(id("SingletonRoom"), "11500", clock.now())])
            .unwrap();
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::WINDOW_EVICTIONS_TOTAL), 2);
}
