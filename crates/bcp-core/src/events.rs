//! Engine progress event stream.
//!
//! Lightweight structured events for CLI and agent consumers. Events are
//! dispatched through an in-process bus supporting multiple subscribers,
//! with JSONL and human line formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{mpsc, Arc, Mutex};

/// Standard engine event names.
pub mod event_names {
    pub const SESSION_STARTED: &str = "session_started";
    pub const SESSION_ENDED: &str = "session_ended";

    pub const MODEL_TRAINING_STARTED: &str = "model_training_started";
    pub const MODEL_TRAINING_COMPLETED: &str = "model_training_completed";
    pub const MODEL_TRAINING_FAILED: &str = "model_training_failed";

    pub const PREDICTION_GENERATED: &str = "prediction_generated";
    pub const DERIVED_STATE_UPDATED: &str = "derived_state_updated";
    pub const HISTORY_APPENDED: &str = "history_appended";
    pub const HISTORY_REPLACED: &str = "history_replaced";
    pub const CHART_UPDATED: &str = "chart_updated";
    pub const NOTIFICATIONS_UPDATED: &str = "notifications_updated";

    pub const CATEGORY_CHANGED: &str = "category_changed";
    pub const TIMEFRAME_CHANGED: &str = "timeframe_changed";
    pub const INTERVAL_CHANGED: &str = "interval_changed";
    pub const REFRESH_ENABLED: &str = "refresh_enabled";
    pub const REFRESH_DISABLED: &str = "refresh_disabled";
    pub const MANUAL_REFRESH: &str = "manual_refresh";

    pub const TICK_FIRED: &str = "tick_fired";
    pub const TICK_SKIPPED: &str = "tick_skipped";
    pub const FETCH_FAILED: &str = "fetch_failed";
    pub const STALE_RESULT_DISCARDED: &str = "stale_result_discarded";
}

/// High-level engine phase for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Session,
    Train,
    Predict,
    Derive,
    Source,
    Refresh,
}

/// Structured engine event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl EngineEvent {
    pub fn new(event: impl Into<String>, phase: Phase) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            run_id: None,
            phase,
            details: HashMap::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }

    /// Single human-readable line for console streaming.
    pub fn to_human_line(&self) -> String {
        let mut line = format!(
            "{} [{:?}] {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.phase,
            self.event
        );
        let mut keys: Vec<&String> = self.details.keys().collect();
        keys.sort();
        for key in keys {
            line.push_str(&format!(" {key}={}", self.details[key]));
        }
        line
    }
}

/// Trait for consuming engine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Broadcast bus supporting multiple subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Mutex<Vec<mpsc::Sender<EngineEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to receive engine events.
    pub fn subscribe(&self) -> mpsc::Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        let mut senders = self.senders.lock().unwrap();
        senders.push(tx);
        rx
    }

    /// Emit an event to all subscribers, pruning dead receivers.
    pub fn emit(&self, event: EngineEvent) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: EngineEvent) {
        self.emit(event);
    }
}

/// JSONL writer for engine events.
pub struct JsonlWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> EventSink for JsonlWriter<W> {
    fn emit(&self, event: EngineEvent) {
        let line = event.to_jsonl();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Human line writer for engine events.
pub struct HumanWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> HumanWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> EventSink for HumanWriter<W> {
    fn emit(&self, event: EngineEvent) {
        let line = event.to_human_line();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Fan-out sink forwarding events to multiple sinks.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: EngineEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

/// Sink that attaches a run ID to every event missing one.
pub struct RunIdSink {
    run_id: String,
    inner: Arc<dyn EventSink>,
}

impl RunIdSink {
    pub fn new(run_id: impl Into<String>, inner: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: run_id.into(),
            inner,
        }
    }
}

impl EventSink for RunIdSink {
    fn emit(&self, mut event: EngineEvent) {
        if event.run_id.is_none() {
            event.run_id = Some(self.run_id.clone());
        }
        self.inner.emit(event);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_jsonl_shape() {
        let event = EngineEvent::new(event_names::PREDICTION_GENERATED, Phase::Predict)
            .with_run_id("bcp-20260821-120000-abcd")
            .with_detail("value", 0.73)
            .with_detail("fallback", false);
        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"prediction_generated""#));
        assert!(json.contains(r#""run_id":"bcp-20260821-120000-abcd""#));
        assert!(json.contains(r#""phase":"predict""#));
        assert!(json.contains(r#""fallback":false"#));
    }

    #[test]
    fn bus_delivers_to_subscribers() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.emit(EngineEvent::new(event_names::SESSION_STARTED, Phase::Session));
        let received = rx.recv().expect("event should be delivered");
        assert_eq!(received.event, event_names::SESSION_STARTED);
    }

    #[test]
    fn bus_prunes_dead_receivers() {
        let bus = EventBus::new();
        {
            let _dropped = bus.subscribe();
        }
        let live = bus.subscribe();
        bus.emit(EngineEvent::new(event_names::TICK_FIRED, Phase::Refresh));
        assert_eq!(live.recv().unwrap().event, event_names::TICK_FIRED);
        assert_eq!(bus.senders.lock().unwrap().len(), 1);
    }

    #[test]
    fn jsonl_writer_writes_one_line_per_event() {
        let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().write(buf)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let writer = JsonlWriter::new(Shared(Arc::clone(&buffer)));
        writer.emit(EngineEvent::new(event_names::TICK_FIRED, Phase::Refresh));
        writer.emit(EngineEvent::new(event_names::TICK_SKIPPED, Phase::Refresh));
        let written = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn run_id_sink_attaches_missing_id() {
        struct Capture {
            last: Mutex<Option<EngineEvent>>,
        }
        impl EventSink for Capture {
            fn emit(&self, event: EngineEvent) {
                *self.last.lock().unwrap() = Some(event);
            }
        }

        let capture = Arc::new(Capture {
            last: Mutex::new(None),
        });
        let sink = RunIdSink::new("bcp-20260821-000000-aaaa", Arc::clone(&capture) as Arc<dyn EventSink>);
        sink.emit(EngineEvent::new(event_names::CHART_UPDATED, Phase::Source));
        let recorded = capture.last.lock().unwrap().clone().expect("event");
        assert_eq!(recorded.run_id.as_deref(), Some("bcp-20260821-000000-aaaa"));
    }

    #[test]
    fn human_line_sorts_details() {
        let event = EngineEvent::new(event_names::CHART_UPDATED, Phase::Source)
            .with_detail("points", 5)
            .with_detail("category", "ticket");
        let line = event.to_human_line();
        let category_at = line.find("category=").unwrap();
        let points_at = line.find("points=").unwrap();
        assert!(category_at < points_at);
    }
}
