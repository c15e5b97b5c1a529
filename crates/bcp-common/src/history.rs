//! Bounded prediction history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of entries retained in a prediction history.
pub const HISTORY_CAPACITY: usize = 10;

/// One point in a prediction history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Display label: "Just now" for live appends, "N min ago" for the
    /// fetched baseline series.
    pub label: String,
    pub value: f64,
    pub confidence: u8,
}

impl HistoryEntry {
    /// Entry for a prediction generated this instant.
    pub fn live(value: f64, confidence: u8) -> Self {
        HistoryEntry {
            label: "Just now".to_string(),
            value,
            confidence,
        }
    }
}

/// FIFO ring of the most recent predictions, oldest first.
///
/// Holds at most [`HISTORY_CAPACITY`] entries. Appending to a full ring
/// evicts the oldest entry; replacing swaps the whole series at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionHistory {
    entries: VecDeque<HistoryEntry>,
}

impl PredictionHistory {
    pub fn new() -> Self {
        PredictionHistory {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a new entry, evicting the oldest when at capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() >= HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Replace the entire series. Used when switching category or when a
    /// fetched baseline arrives. Input beyond capacity keeps the newest
    /// entries.
    pub fn replace_all(&mut self, entries: Vec<HistoryEntry>) {
        self.entries.clear();
        for entry in entries {
            self.append(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Entries oldest to newest.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry {
            label: format!("entry {i}"),
            value: i as f64 / 100.0,
            confidence: (i % 100) as u8,
        }
    }

    #[test]
    fn append_below_capacity_keeps_everything() {
        let mut history = PredictionHistory::new();
        for i in 0..5 {
            history.append(entry(i));
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.snapshot()[0], entry(0));
        assert_eq!(history.latest(), Some(&entry(4)));
    }

    #[test]
    fn append_evicts_oldest_beyond_capacity() {
        let mut history = PredictionHistory::new();
        for i in 0..25 {
            history.append(entry(i));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let snapshot = history.snapshot();
        assert_eq!(snapshot[0], entry(15));
        assert_eq!(snapshot[9], entry(24));
    }

    #[test]
    fn replace_all_swaps_the_series() {
        let mut history = PredictionHistory::new();
        for i in 0..8 {
            history.append(entry(i));
        }
        history.replace_all(vec![entry(100), entry(101)]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.snapshot(), vec![entry(100), entry(101)]);
    }

    #[test]
    fn replace_all_truncates_to_newest() {
        let mut history = PredictionHistory::new();
        history.replace_all((0..15).map(entry).collect());
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.snapshot()[0], entry(5));
    }

    proptest! {
        #[test]
        fn ring_holds_last_entries_in_order(count in 0_usize..40) {
            let mut history = PredictionHistory::new();
            for i in 0..count {
                history.append(entry(i));
            }
            let expected_len = count.min(HISTORY_CAPACITY);
            prop_assert_eq!(history.len(), expected_len);
            let snapshot = history.snapshot();
            let first = count.saturating_sub(HISTORY_CAPACITY);
            for (offset, got) in snapshot.iter().enumerate() {
                prop_assert_eq!(got, &entry(first + offset));
            }
        }
    }
}
