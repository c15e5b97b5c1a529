//! Fuzz target for the bounded prediction history ring.
//!
//! Drives the ring with arbitrary append/replace sequences and checks the
//! capacity bound and newest-entry tracking hold after every operation.

#![no_main]

use arbitrary::Arbitrary;
use bcp_common::{HistoryEntry, PredictionHistory, HISTORY_CAPACITY};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum HistoryOp {
    Append { value: f64, confidence: u8 },
    Replace { count: u8 },
}

fuzz_target!(|ops: Vec<HistoryOp>| {
    let mut history = PredictionHistory::new();
    for op in ops {
        match op {
            HistoryOp::Append { value, confidence } => {
                history.append(HistoryEntry::live(value, confidence));
                assert_eq!(history.latest().map(|e| e.confidence), Some(confidence));
            }
            HistoryOp::Replace { count } => {
                let entries: Vec<HistoryEntry> = (0..count)
                    .map(|i| HistoryEntry {
                        label: format!("{i} min ago"),
                        value: f64::from(i) / 100.0,
                        confidence: i,
                    })
                    .collect();
                history.replace_all(entries);
                assert_eq!(history.len(), usize::from(count).min(HISTORY_CAPACITY));
            }
        }
        assert!(history.len() <= HISTORY_CAPACITY);
        assert_eq!(history.snapshot().len(), history.len());
    }
});
