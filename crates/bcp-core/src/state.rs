//! Engine session state and snapshots.
//!
//! All mutable session state lives in [`EngineState`], owned by the single
//! engine thread. Transitions are plain methods so the state machine is
//! unit-testable without threads or I/O. [`EngineSnapshot`] is the
//! serializable read model handed to CLI output and tests.

use bcp_common::{
    Category, HistoryEntry, Prediction, PredictionHistory, RefreshConfig, RunId, Timeframe,
};
use bcp_model::PriorityNet;
use bcp_sources::{ChartPoint, NotificationRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advice::{advice_for, alerts_for, AlertRecord};

/// Model lifecycle.
#[derive(Debug, Clone)]
pub enum ModelState {
    Untrained,
    Training,
    Ready(PriorityNet),
    Failed { reason: String },
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }

    pub fn net(&self) -> Option<&PriorityNet> {
        match self {
            ModelState::Ready(net) => Some(net),
            _ => None,
        }
    }

    pub fn phase(&self) -> ModelPhase {
        match self {
            ModelState::Untrained => ModelPhase::Untrained,
            ModelState::Training => ModelPhase::Training,
            ModelState::Ready(_) => ModelPhase::Ready,
            ModelState::Failed { .. } => ModelPhase::Failed,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            ModelState::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Snapshot-facing model phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPhase {
    Untrained,
    Training,
    Ready,
    Failed,
}

/// All mutable session state, owned by the engine thread.
#[derive(Debug)]
pub struct EngineState {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub category: Category,
    pub timeframe: Timeframe,
    pub model: ModelState,
    pub prediction: Option<Prediction>,
    pub advice_index: usize,
    pub alert_index: usize,
    pub history: PredictionHistory,
    pub chart: Vec<ChartPoint>,
    pub notifications: Vec<NotificationRecord>,
    pub refresh: RefreshConfig,
    /// Category/timeframe epoch. Async completions born under an older
    /// generation are discarded on arrival.
    pub generation: u64,
    pub tick_count: u64,
    pub prediction_count: u64,
    pub stale_discarded: u64,
}

impl EngineState {
    pub fn new(category: Category, timeframe: Timeframe, refresh: RefreshConfig) -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            category,
            timeframe,
            model: ModelState::Untrained,
            prediction: None,
            advice_index: 0,
            alert_index: 0,
            history: PredictionHistory::new(),
            chart: Vec::new(),
            notifications: Vec::new(),
            refresh,
            generation: 0,
            tick_count: 0,
            prediction_count: 0,
            stale_discarded: 0,
        }
    }

    /// Switch category, invalidating all in-flight completions.
    /// Returns the new generation.
    pub fn switch_category(&mut self, category: Category) -> u64 {
        self.category = category;
        self.bump_generation()
    }

    /// Switch timeframe, invalidating all in-flight completions.
    /// Returns the new generation.
    pub fn switch_timeframe(&mut self, timeframe: Timeframe) -> u64 {
        self.timeframe = timeframe;
        self.bump_generation()
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether a completion tagged with `generation` is still current.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn record_stale(&mut self) {
        self.stale_discarded += 1;
    }
}

/// Serializable read model of the engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub category: Category,
    pub timeframe: Timeframe,
    pub model: ModelPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    pub advice_index: usize,
    pub alert_index: usize,
    pub alerts: Vec<AlertRecord>,
    pub history: Vec<HistoryEntry>,
    pub chart: Vec<ChartPoint>,
    pub notifications: Vec<NotificationRecord>,
    pub refresh: RefreshConfig,
    pub generation: u64,
    pub tick_count: u64,
    pub prediction_count: u64,
    pub stale_discarded: u64,
}

impl EngineSnapshot {
    pub fn capture(state: &EngineState) -> Self {
        let band = state.prediction.map(|p| p.band());
        Self {
            run_id: state.run_id.clone(),
            generated_at: Utc::now(),
            category: state.category,
            timeframe: state.timeframe,
            model: state.model.phase(),
            model_failure: state.model.failure().map(str::to_string),
            prediction: state.prediction,
            prediction_label: band.map(|b| {
                bcp_common::prediction::band_label(state.category, b).to_string()
            }),
            advice: band
                .map(|b| advice_for(state.category, state.advice_index, b).to_string()),
            advice_index: state.advice_index,
            alert_index: state.alert_index,
            alerts: band
                .map(|b| {
                    alerts_for(state.category, b)
                        .iter()
                        .map(AlertRecord::from)
                        .collect()
                })
                .unwrap_or_default(),
            history: state.history.snapshot(),
            chart: state.chart.clone(),
            notifications: state.notifications.clone(),
            refresh: state.refresh,
            generation: state.generation,
            tick_count: state.tick_count,
            prediction_count: state.prediction_count,
            stale_discarded: state.stale_discarded,
        }
    }
}
