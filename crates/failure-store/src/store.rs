//! Failure Store Implementation

use crate::FailureEvent;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::debug;

/// Initial capacity; a healthy upstream rarely retains more than a handful
const INITIAL_CAPACITY: usize = 64;

/// Append-only, time-prunable sequence of failures (insertion order = chronological)
///
/// Not synchronized on its own; the owner serializes access.
#[derive(Debug)]
pub struct FailureStore {
    events: VecDeque<FailureEvent>,
}

impl FailureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Add an event at the end
    pub fn append(&mut self, event: FailureEvent) {
        self.events.push_back(event);
    }

    /// Remove every event with `timestamp <= cutoff`, returning how many were dropped
    pub fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.events.len();
        self.events.retain(|event| event.timestamp() > cutoff);
        let removed = before - self.events.len();

        if removed > 0 {
            debug!("Pruned {} failure events at or before {}", removed, cutoff);
        }
        removed
    }

    /// Empty the store
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Empty the store and hand back what it held, oldest first
    pub fn drain_all(&mut self) -> Vec<FailureEvent> {
        self.events.drain(..).collect()
    }

    /// Number of retained events
    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The last `n` events in chronological order (fewer if the store holds less)
    pub fn recent(&self, n: usize) -> Vec<&FailureEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).collect()
    }

    /// All retained events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &FailureEvent> {
        self.events.iter()
    }
}

impl Default for FailureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentityFields;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn event_at(offset_secs: i64, class: &str) -> FailureEvent {
        FailureEvent::new(
            base() + Duration::seconds(offset_secs),
            Some(class.to_string()),
            None,
            None,
            IdentityFields::default(),
        )
    }

    #[test]
    fn test_append_and_recent() {
        let mut store = FailureStore::new();
        for i in 0..5 {
            store.append(event_at(i, &format!("E{}", i)));
        }

        assert_eq!(store.size(), 5);

        let recent = store.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].error_class(), Some("E2")); // Oldest of the three
        assert_eq!(recent[2].error_class(), Some("E4"));

        assert_eq!(store.recent(10).len(), 5);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_prune_excludes_events_at_cutoff() {
        let mut store = FailureStore::new();
        store.append(event_at(0, "a"));
        store.append(event_at(20, "b"));
        store.append(event_at(21, "c"));

        let removed = store.prune(base() + Duration::seconds(20));

        assert_eq!(removed, 2);
        assert_eq!(store.size(), 1);
        assert_eq!(store.recent(1)[0].error_class(), Some("c"));
    }

    #[test]
    fn test_drain_all_empties_store() {
        let mut store = FailureStore::new();
        store.append(event_at(0, "a"));
        store.append(event_at(1, "b"));

        let drained = store.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].error_class(), Some("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut store = FailureStore::new();
        store.append(event_at(0, "a"));
        store.clear();
        assert_eq!(store.size(), 0);
    }

    proptest! {
        #[test]
        fn prop_prune_keeps_exactly_events_inside_window(
            mut offsets in proptest::collection::vec(0i64..600, 0..50),
            now_offset in 0i64..700,
            window in 0i64..300,
        ) {
            offsets.sort_unstable();
            let mut store = FailureStore::new();
            for (i, offset) in offsets.iter().enumerate() {
                store.append(event_at(*offset, &i.to_string()));
            }

            let cutoff = base() + Duration::seconds(now_offset - window);
            store.prune(cutoff);

            let expected: Vec<String> = offsets
                .iter()
                .enumerate()
                .filter(|(_, offset)| base() + Duration::seconds(**offset) > cutoff)
                .map(|(i, _)| i.to_string())
                .collect();
            let retained: Vec<String> = store
                .iter()
                .filter_map(|e| e.error_class().map(str::to_string))
                .collect();

            prop_assert_eq!(retained, expected);
        }
    }
}
