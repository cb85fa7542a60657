//! Bounded, sequence-ordered record of delivered events.

use crate::event::Event;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Distinct events ever delivered, newest sequence first, capped at `limit`.
///
/// Two events are the same when both their identifier and their sequence
/// match. Events with equal sequences keep most-recently-recorded first.
#[derive(Debug, Clone)]
pub struct EventHistory<E> {
    events: Vec<E>,
    limit: usize,
}

impl<E: Event> Default for EventHistory<E> {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl<E: Event> EventHistory<E> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record one event. Returns `false` when it was already present or fell
    /// outside the cap.
    pub fn record(&mut self, event: E) -> bool {
        let exists = self
            .events
            .iter()
            .any(|e| e.event_id() == event.event_id() && e.sequence() == event.sequence());
        if exists {
            return false;
        }

        let seq = event.sequence();
        let at = self.events.partition_point(|e| e.sequence() > seq);
        if at >= self.limit {
            return false;
        }
        self.events.insert(at, event);
        self.events.truncate(self.limit);
        true
    }

    /// Record a batch in delivery order. Returns how many were retained.
    pub fn extend(&mut self, events: impl IntoIterator<Item = E>) -> usize {
        let mut kept = 0;
        for event in events {
            if self.record(event) {
                kept += 1;
            }
        }
        kept
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
