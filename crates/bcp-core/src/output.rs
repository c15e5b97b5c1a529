//! stdout payload rendering.
//!
//! Every command payload renders in all four output formats. stdout carries
//! only the payload; logs and progress stay on stderr.

use bcp_common::{Category, HistoryEntry, OutputFormat, Timeframe};
use bcp_model::TrainReport;
use bcp_sources::{ChartPoint, NotificationRecord, PerformerRecord};
use serde::Serialize;

use crate::state::{EngineSnapshot, ModelPhase};

fn json_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Render a full engine snapshot.
pub fn render_snapshot(snapshot: &EngineSnapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json_pretty(snapshot),
        OutputFormat::Jsonl => json_line(snapshot),
        OutputFormat::Md => snapshot_md(snapshot),
        OutputFormat::Summary => snapshot_summary(snapshot),
    }
}

fn snapshot_summary(snapshot: &EngineSnapshot) -> String {
    match (&snapshot.prediction, &snapshot.prediction_label) {
        (Some(prediction), Some(label)) => format!(
            "[{}] {} {}: {:.3} ({}% confidence) {}",
            snapshot.run_id,
            snapshot.category,
            snapshot.timeframe,
            prediction.value,
            prediction.confidence,
            label
        ),
        _ => format!(
            "[{}] {} {}: no prediction (model {})",
            snapshot.run_id,
            snapshot.category,
            snapshot.timeframe,
            phase_name(snapshot.model)
        ),
    }
}

fn phase_name(phase: ModelPhase) -> &'static str {
    match phase {
        ModelPhase::Untrained => "untrained",
        ModelPhase::Training => "training",
        ModelPhase::Ready => "ready",
        ModelPhase::Failed => "failed",
    }
}

fn snapshot_md(snapshot: &EngineSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} Prediction\n\n", snapshot.category.title()));
    out.push_str(&format!("Run: {}\n", snapshot.run_id));
    out.push_str(&format!(
        "Category: {} | Timeframe: {} | Model: {}\n\n",
        snapshot.category,
        snapshot.timeframe,
        phase_name(snapshot.model)
    ));

    match (&snapshot.prediction, &snapshot.prediction_label) {
        (Some(prediction), Some(label)) => {
            out.push_str(&format!(
                "**{label}** — value {:.4}, confidence {}%\n\n",
                prediction.value, prediction.confidence
            ));
        }
        _ => {
            out.push_str("No prediction available.\n");
            if let Some(reason) = &snapshot.model_failure {
                out.push_str(&format!("Training failure: {reason}\n"));
            }
            out.push('\n');
        }
    }

    if let Some(advice) = &snapshot.advice {
        out.push_str("## Advice\n\n");
        out.push_str(&format!("{advice}\n\n"));
    }

    if !snapshot.alerts.is_empty() {
        out.push_str("## Alerts\n\n");
        for alert in &snapshot.alerts {
            out.push_str(&format!("- **{}**: {}\n", alert.title, alert.description));
        }
        out.push('\n');
    }

    if !snapshot.history.is_empty() {
        out.push_str("## History\n\n");
        out.push_str(&history_md(&snapshot.history));
        out.push('\n');
    }

    if !snapshot.chart.is_empty() {
        out.push_str(&format!("## {}\n\n", snapshot.category.chart_title()));
        out.push_str(&chart_md(&snapshot.chart));
        out.push('\n');
    }

    if !snapshot.notifications.is_empty() {
        out.push_str("## Notifications\n\n");
        for notification in &snapshot.notifications {
            out.push_str(&format!(
                "- {} — {} ({})\n",
                notification.title, notification.description, notification.time
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Auto-refresh: {} ({})\n",
        if snapshot.refresh.enabled { "on" } else { "off" },
        snapshot.refresh.interval.label()
    ));
    out
}

fn history_md(history: &[HistoryEntry]) -> String {
    let mut out = String::from("| When | Value | Confidence |\n|---|---|---|\n");
    for entry in history {
        out.push_str(&format!(
            "| {} | {:.3} | {}% |\n",
            entry.label, entry.value, entry.confidence
        ));
    }
    out
}

fn chart_md(points: &[ChartPoint]) -> String {
    let mut out = String::from("| Name | Value |\n|---|---|\n");
    for point in points {
        out.push_str(&format!("| {} | {:.1} |\n", point.name, point.value));
    }
    out
}

/// One fetcher's records, tagged for machine output.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum FetchPayload {
    Chart(Vec<ChartPoint>),
    History(Vec<HistoryEntry>),
    Notifications(Vec<NotificationRecord>),
    Performers(Vec<PerformerRecord>),
}

impl FetchPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchPayload::Chart(_) => "chart",
            FetchPayload::History(_) => "history",
            FetchPayload::Notifications(_) => "notifications",
            FetchPayload::Performers(_) => "performers",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FetchPayload::Chart(records) => records.len(),
            FetchPayload::History(records) => records.len(),
            FetchPayload::Notifications(records) => records.len(),
            FetchPayload::Performers(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload of `bcp fetch` and `bcp history`.
#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub category: Category,
    pub timeframe: Timeframe,
    #[serde(flatten)]
    pub payload: FetchPayload,
}

pub fn render_fetch(report: &FetchReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json_pretty(report),
        OutputFormat::Jsonl => json_line(report),
        OutputFormat::Md => fetch_md(report),
        OutputFormat::Summary => format!(
            "fetched {} {} record(s) for {} ({})",
            report.payload.len(),
            report.payload.kind(),
            report.category,
            report.timeframe
        ),
    }
}

fn fetch_md(report: &FetchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} — {} ({})\n\n",
        report.category.title(),
        report.payload.kind(),
        report.timeframe
    ));
    if report.payload.is_empty() {
        out.push_str("No records (source unreachable or empty).\n");
        return out;
    }
    match &report.payload {
        FetchPayload::Chart(points) => out.push_str(&chart_md(points)),
        FetchPayload::History(series) => out.push_str(&history_md(series)),
        FetchPayload::Notifications(records) => {
            for record in records {
                out.push_str(&format!(
                    "- {} — {} ({})\n",
                    record.title, record.description, record.time
                ));
            }
        }
        FetchPayload::Performers(records) => {
            out.push_str("| Rank | Name | Department | Metric |\n|---|---|---|---|\n");
            for (rank, record) in records.iter().enumerate() {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    rank + 1,
                    record.name,
                    record.department,
                    record.metric
                ));
            }
        }
    }
    out
}

/// Per-row model output after training, for `bcp train`.
#[derive(Debug, Serialize)]
pub struct RowOutcome {
    pub features: [f32; 4],
    pub target: f32,
    pub output: f64,
}

/// Payload of `bcp train`.
#[derive(Debug, Serialize)]
pub struct TrainOutcome {
    pub report: TrainReport,
    pub rows: Vec<RowOutcome>,
}

pub fn render_train(outcome: &TrainOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json_pretty(outcome),
        OutputFormat::Jsonl => json_line(outcome),
        OutputFormat::Md => train_md(outcome),
        OutputFormat::Summary => format!(
            "trained {} parameters over {} epochs in {}ms, final loss {:.6}",
            outcome.report.parameter_count,
            outcome.report.epochs_run,
            outcome.report.duration_ms,
            outcome.report.final_loss
        ),
    }
}

fn train_md(outcome: &TrainOutcome) -> String {
    let mut out = String::from("# Training Report\n\n");
    out.push_str(&format!(
        "Epochs: {} | Final loss: {:.6} | Duration: {}ms | Parameters: {}\n\n",
        outcome.report.epochs_run,
        outcome.report.final_loss,
        outcome.report.duration_ms,
        outcome.report.parameter_count
    ));
    out.push_str("| Features | Target | Output |\n|---|---|---|\n");
    for row in &outcome.rows {
        out.push_str(&format!(
            "| {:?} | {:.0} | {:.4} |\n",
            row.features, row.target, row.output
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineState;
    use bcp_common::{Prediction, RefreshConfig};

    fn ready_snapshot() -> EngineSnapshot {
        let mut state =
            EngineState::new(Category::Ticket, Timeframe::Weekly, RefreshConfig::default());
        state.prediction = Some(Prediction::from_value(0.87));
        state.chart = vec![ChartPoint {
            name: "Technical".to_string(),
            value: 120.0,
        }];
        EngineSnapshot::capture(&state)
    }

    #[test]
    fn summary_is_one_line_with_label() {
        let line = render_snapshot(&ready_snapshot(), OutputFormat::Summary);
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("High Priority"));
        assert!(line.contains("74% confidence"));
    }

    #[test]
    fn json_round_trips_the_snapshot() {
        let rendered = render_snapshot(&ready_snapshot(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["category"], "ticket");
        assert_eq!(value["alerts"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn jsonl_is_single_line() {
        let rendered = render_snapshot(&ready_snapshot(), OutputFormat::Jsonl);
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn md_contains_sections_for_populated_state() {
        let rendered = render_snapshot(&ready_snapshot(), OutputFormat::Md);
        assert!(rendered.contains("# Ticket Priority Prediction"));
        assert!(rendered.contains("## Advice"));
        assert!(rendered.contains("## Alerts"));
        assert!(rendered.contains("Ticket Distribution by Type"));
        assert!(!rendered.contains("## Notifications"));
    }

    #[test]
    fn summary_reports_missing_prediction() {
        let state =
            EngineState::new(Category::Sales, Timeframe::Monthly, RefreshConfig::default());
        let line = render_snapshot(&EngineSnapshot::capture(&state), OutputFormat::Summary);
        assert!(line.contains("no prediction"));
        assert!(line.contains("model untrained"));
    }

    #[test]
    fn fetch_report_serializes_flat() {
        let report = FetchReport {
            category: Category::Enquiry,
            timeframe: Timeframe::Weekly,
            payload: FetchPayload::Chart(vec![ChartPoint {
                name: "Pricing".to_string(),
                value: 30.0,
            }]),
        };
        let value: serde_json::Value =
            serde_json::from_str(&render_fetch(&report, OutputFormat::Json)).unwrap();
        assert_eq!(value["kind"], "chart");
        assert_eq!(value["records"][0]["name"], "Pricing");

        let summary = render_fetch(&report, OutputFormat::Summary);
        assert!(summary.contains("1 chart record(s) for enquiry"));
    }

    #[test]
    fn train_summary_has_loss_and_duration() {
        let outcome = TrainOutcome {
            report: TrainReport {
                epochs_run: 100,
                final_loss: 0.231,
                duration_ms: 12,
                parameter_count: 225,
            },
            rows: vec![RowOutcome {
                features: [0.2, 0.0, 1.0, 0.5],
                target: 0.0,
                output: 0.41,
            }],
        };
        let summary = render_train(&outcome, OutputFormat::Summary);
        assert!(summary.contains("100 epochs"));
        assert!(summary.contains("0.231"));
        let md = render_train(&outcome, OutputFormat::Md);
        assert!(md.contains("| Features | Target | Output |"));
    }
}
