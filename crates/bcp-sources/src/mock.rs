//! Deterministic in-memory [`DataSource`] for tests.
//!
//! `MockSource` replaces the HTTP-backed source in engine and CLI tests.
//! It supports:
//!
//! - Category-stamped payloads, so a test can prove which category a
//!   result was produced for (stale-response assertions)
//! - Optional artificial latency to widen race windows
//! - A call log recording every fetch in issue order
//! - A failure switch that makes every accessor return empty
//!
//! # Example
//!
//! ```ignore
//! use bcp_sources::mock::MockSource;
//! use std::time::Duration;
//!
//! let source = MockSource::new().with_latency(Duration::from_millis(50));
//! // ... drive the engine ...
//! assert_eq!(source.calls(), vec!["chart:ticket:weekly", "history:ticket"]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use bcp_common::prediction::confidence_percent;
use bcp_common::{Category, HistoryEntry, Prediction, Timeframe};

use crate::records::{
    ChartPoint, NotificationKind, NotificationRecord, PerformerRecord, PerformerScope,
};
use crate::DataSource;

/// In-memory source with deterministic, category-stamped payloads.
#[derive(Debug, Default)]
pub struct MockSource {
    latency: Option<Duration>,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` inside every accessor.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every accessor return empty, as the remote source does when the
    /// network is down.
    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every fetch issued so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Number of logged calls whose entry starts with `prefix`.
    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .map(|log| log.iter().filter(|entry| entry.starts_with(prefix)).count())
            .unwrap_or(0)
    }

    fn record(&self, entry: String) -> bool {
        if let Ok(mut log) = self.calls.lock() {
            log.push(entry);
        }
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        !self.failing.load(Ordering::SeqCst)
    }
}

impl DataSource for MockSource {
    fn chart_data(&self, category: Category, timeframe: Timeframe) -> Vec<ChartPoint> {
        if !self.record(format!("chart:{category}:{timeframe}")) {
            return Vec::new();
        }
        let multiplier = timeframe.multiplier();
        (1..=3)
            .map(|i| ChartPoint {
                name: format!("{} {i}", category.name()),
                value: (i * 10) as f64 * multiplier,
            })
            .collect()
    }

    fn history_series(&self, category: Category) -> Vec<HistoryEntry> {
        if !self.record(format!("history:{category}")) {
            return Vec::new();
        }
        // distinct per-category values so replacement is observable
        let base = match category {
            Category::Ticket => 0.2,
            Category::Sales => 0.4,
            Category::Enquiry => 0.6,
        };
        (1..=3)
            .map(|i| {
                let value = base + (i as f64) * 0.05;
                HistoryEntry {
                    label: format!("{i} min ago"),
                    value,
                    confidence: confidence_percent(value),
                }
            })
            .collect()
    }

    fn notifications(
        &self,
        category: Category,
        prediction: &Prediction,
    ) -> Vec<NotificationRecord> {
        if !self.record(format!("notifications:{category}")) {
            return Vec::new();
        }
        vec![NotificationRecord {
            kind: if prediction.band().is_high() {
                NotificationKind::Alert
            } else {
                NotificationKind::Clock
            },
            title: format!("{} update", category.name()),
            description: format!("confidence {}%", prediction.confidence),
            time: "Just now".to_string(),
        }]
    }

    fn top_performers(&self, scope: PerformerScope) -> Vec<PerformerRecord> {
        if !self.record(format!("performers:{scope}")) {
            return Vec::new();
        }
        (1..=3u64)
            .map(|i| PerformerRecord {
                id: i,
                name: format!("Performer {i}"),
                department: "Mock".to_string(),
                score: 400 - i * 100,
                metric: (400 - i * 100).to_string(),
            })
            .collect()
    }
}
