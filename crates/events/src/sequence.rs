//! Bounded per-identifier sequence tracking (duplicate and stale suppression).
//!
//! Events arrive at least once and in any order. For each event identifier we
//! remember the highest sequence accepted so far; anything at or below it is
//! stale. The map is bounded: once it holds `capacity` identifiers it is
//! trimmed to the `retain` entries with the highest sequences (ties broken by
//! identifier, so the outcome is deterministic). An identifier dropped by a
//! trim is forgotten and its next event is accepted whatever its sequence.

use std::collections::HashMap;

use tracing::debug;

use shelfwatch_core::EventId;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_RETAIN: usize = 500;

#[derive(Debug, Clone)]
pub struct SequenceTracker {
    seen: HashMap<EventId, u64>,
    capacity: usize,
    retain: usize,
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_RETAIN)
    }
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is clamped to at least 1 and `retain` to below `capacity`.
    pub fn with_limits(capacity: usize, retain: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashMap::with_capacity(capacity),
            capacity,
            retain: retain.min(capacity - 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retain(&self) -> usize {
        self.retain
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Highest sequence accepted for `id`, if it is still tracked.
    pub fn last_seen(&self, id: &EventId) -> Option<u64> {
        self.seen.get(id).copied()
    }

    /// Record `sequence` for `id` if it is newer than anything tracked.
    ///
    /// Returns `true` when the event should be delivered.
    pub fn observe(&mut self, id: &EventId, sequence: u64) -> bool {
        if let Some(&last) = self.seen.get(id) {
            if last >= sequence {
                return false;
            }
        }

        self.seen.insert(id.clone(), sequence);
        if self.seen.len() >= self.capacity {
            self.trim();
        }
        true
    }

    fn trim(&mut self) {
        let before = self.seen.len();
        let mut entries: Vec<(EventId, u64)> = self.seen.drain().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(self.retain);
        self.seen = entries.into_iter().collect();

        debug!(before, after = self.seen.len(), "trimmed sequence tracker");
    }
}
