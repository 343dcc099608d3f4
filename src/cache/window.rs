//! Sliding window of recently fetched references.
//!
//! [`ReferenceWindow`] remembers which identifiers were fetched recently and
//! when, oldest first. It is not the cache of record: its only job is to
//! propose *other* identifiers that are about to expire (or just have) so a
//! cache miss can refresh them in the same oracle call.
//!
//! The window performs no synchronization. Mutation needs `&mut self`, and
//! the owning [`ReferenceCache`](super::ReferenceCache) serializes every
//! access behind its own lock.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::telemetry;
use crate::types::{Identifier, Reference};

/// Time-ordered history of references used for refresh-candidate selection.
///
/// Entries must be added in non-decreasing `fetched_at` order; the window
/// does not sort. Alongside the sequence it tracks, per identifier, the most
/// recent `fetched_at` seen. Older duplicates stay in the sequence until
/// trimmed but are never proposed as candidates.
#[derive(Debug)]
pub struct ReferenceWindow {
    max_age: Duration,
    refresh_candidate_age: Duration,
    entries: VecDeque<Reference>,
    latest: HashMap<Identifier, Instant>,
}

impl ReferenceWindow {
    /// Create an empty window.
    ///
    /// `max_age` bounds how long an entry is retained (trimmed lazily on
    /// [`add`](Self::add)); `refresh_candidate_age` is the staleness at
    /// which an identifier becomes a refresh candidate.
    pub fn new(max_age: Duration, refresh_candidate_age: Duration) -> Self {
        Self {
            max_age,
            refresh_candidate_age,
            entries: VecDeque::new(),
            latest: HashMap::new(),
        }
    }

    /// Append `reference`, first trimming entries older than `max_age` at `now`.
    ///
    /// Trimming only happens here. When a trimmed entry is the latest one
    /// recorded for its identifier, that record is dropped too, so a fully
    /// expired identifier has no latest timestamp at all.
    pub fn add(&mut self, reference: Reference, now: Instant) {
        let mut evicted = 0u64;
        while let Some(front) = self.entries.front() {
            if front.age_at(now) <= self.max_age {
                break;
            }
            if self.latest.get(&front.identifier) == Some(&front.fetched_at) {
                self.latest.remove(&front.identifier);
            }
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "trimmed reference window");
            metrics::counter!(telemetry::WINDOW_EVICTIONS_TOTAL).increment(evicted);
        }

        self.latest
            .insert(reference.identifier.clone(), reference.fetched_at);
        self.entries.push_back(reference);
    }

    /// Up to `count` identifiers due for refresh at `now`. Does not mutate.
    ///
    /// Eligible entries are those at least `refresh_candidate_age` old. The
    /// walk starts from the newest eligible entry and moves towards the
    /// oldest, so identifiers just past the threshold come first and
    /// long-expired ones last. An entry is only taken if it is the latest
    /// one for its identifier, which both deduplicates and skips identifiers
    /// that were fetched again more recently.
    ///
    /// The boundary is the first entry younger than the threshold. A window
    /// without one (empty, or every entry eligible) proposes nothing.
    pub fn refresh_candidates(&self, count: usize, now: Instant) -> Vec<Identifier> {
        if count == 0 {
            return Vec::new();
        }

        // Ages are non-increasing along the deque, so eligibility is a prefix.
        let boundary = self
            .entries
            .partition_point(|r| r.age_at(now) >= self.refresh_candidate_age);
        if boundary == 0 || boundary == self.entries.len() {
            return Vec::new();
        }

        let mut candidates = Vec::with_capacity(count.min(boundary));
        for reference in self.entries.range(..boundary).rev() {
            if self.latest.get(&reference.identifier) == Some(&reference.fetched_at) {
                debug!(
                    identifier = %reference.identifier,
                    age_secs = reference.age_at(now).as_secs(),
                    "selected refresh candidate"
                );
                candidates.push(reference.identifier.clone());
                if candidates.len() >= count {
                    break;
                }
            }
        }
        candidates
    }

    /// Number of entries currently held, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest recorded fetch time for `identifier`, if it is still in the window.
    pub fn latest_fetch(&self, identifier: &Identifier) -> Option<Instant> {
        self.latest.get(identifier).copied()
    }
}
