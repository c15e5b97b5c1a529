//! The prediction engine.
//!
//! All session state is owned by one engine thread consuming an `mpsc`
//! command queue. Remote fetches run on short-lived worker threads that
//! post their results back into the same queue, tagged with the generation
//! they were born under; the engine discards completions whose generation
//! no longer matches, so a slow fetch for one category can never overwrite
//! state for another. Timer ticks arrive the same way, tagged with the
//! scheduler epoch.
//!
//! [`Engine`] is the thread-safe handle: commands go in, snapshots and
//! events come out. Dropping it shuts the engine down and joins the thread.

use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bcp_common::config::EngineConfig;
use bcp_common::{
    Category, Error, HistoryEntry, RefreshConfig, RefreshInterval, Result, RunId, Timeframe,
};
use bcp_model::{builtin_training_set, train, TrainOptions};
use bcp_sources::{ChartPoint, DataSource, NotificationRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::derive;
use crate::events::{event_names, EngineEvent, EventSink, Phase, RunIdSink};
use crate::predict;
use crate::scheduler::RefreshScheduler;
use crate::state::{EngineSnapshot, EngineState, ModelState};

/// Delay between a category/timeframe switch and the follow-up prediction,
/// letting the switched state settle first.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Commands consumed by the engine thread.
///
/// External callers send the first group through [`Engine`]; the second
/// group is posted internally by timer and fetch workers.
#[derive(Debug)]
pub enum EngineCommand {
    SwitchCategory(Category),
    SwitchTimeframe(Timeframe),
    ManualRefresh,
    EnableRefresh(RefreshInterval),
    DisableRefresh,
    ChangeInterval(RefreshInterval),
    Snapshot(mpsc::Sender<EngineSnapshot>),
    Shutdown,

    Tick {
        epoch: u64,
    },
    SettleElapsed {
        generation: u64,
    },
    ChartFetched {
        generation: u64,
        points: Vec<ChartPoint>,
    },
    HistoryFetched {
        generation: u64,
        series: Vec<HistoryEntry>,
    },
    NotificationsFetched {
        generation: u64,
        records: Vec<NotificationRecord>,
    },
}

/// Startup parameters for an engine session.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub category: Category,
    pub timeframe: Timeframe,
    pub refresh: RefreshConfig,
    pub train: TrainOptions,
    pub settle_delay: Duration,
    /// Fixed RNG seed for deterministic sessions; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            category: Category::Ticket,
            timeframe: Timeframe::Weekly,
            refresh: RefreshConfig::default(),
            train: TrainOptions::default(),
            settle_delay: SETTLE_DELAY,
            seed: None,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        EngineOptions {
            category: config.defaults.category,
            timeframe: config.defaults.timeframe,
            refresh: config.refresh,
            ..EngineOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Thread-safe handle to a running engine.
pub struct Engine {
    tx: mpsc::Sender<EngineCommand>,
    thread: Option<JoinHandle<()>>,
    run_id: RunId,
}

impl Engine {
    /// Start an engine session on a background thread.
    ///
    /// The worker trains the model, issues the initial fetches, generates
    /// the first prediction, and arms the refresh timer if enabled, then
    /// settles into its command loop. Events flow into `sink` with the
    /// session run ID attached.
    pub fn spawn(
        options: EngineOptions,
        source: Arc<dyn DataSource>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Engine> {
        let (tx, rx) = mpsc::channel();
        let worker = EngineWorker::new(options, source, sink, tx.clone());
        let run_id = worker.state.run_id.clone();
        let thread = thread::Builder::new()
            .name("bcp-engine".to_string())
            .spawn(move || worker.run(rx))?;
        Ok(Engine {
            tx,
            thread: Some(thread),
            run_id,
        })
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn switch_category(&self, category: Category) -> Result<()> {
        self.send(EngineCommand::SwitchCategory(category))
    }

    pub fn switch_timeframe(&self, timeframe: Timeframe) -> Result<()> {
        self.send(EngineCommand::SwitchTimeframe(timeframe))
    }

    pub fn manual_refresh(&self) -> Result<()> {
        self.send(EngineCommand::ManualRefresh)
    }

    pub fn enable_refresh(&self, interval: RefreshInterval) -> Result<()> {
        self.send(EngineCommand::EnableRefresh(interval))
    }

    pub fn disable_refresh(&self) -> Result<()> {
        self.send(EngineCommand::DisableRefresh)
    }

    pub fn change_interval(&self, interval: RefreshInterval) -> Result<()> {
        self.send(EngineCommand::ChangeInterval(interval))
    }

    /// Capture a consistent snapshot of the session state.
    ///
    /// Blocks until the engine thread services the request, so the snapshot
    /// reflects every command sent before this call.
    pub fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(EngineCommand::Snapshot(reply_tx))?;
        reply_rx.recv().map_err(|_| Error::EngineClosed)
    }

    /// Stop the engine and join its thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.send(EngineCommand::Shutdown)?;
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| Error::EngineClosed)?;
        }
        Ok(())
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::EngineClosed)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Engine internals, owned by the engine thread.
///
/// Every method runs on that single thread; the command queue is the only
/// way in. Kept separate from [`Engine`] so the full state machine is
/// drivable synchronously in tests.
struct EngineWorker {
    state: EngineState,
    source: Arc<dyn DataSource>,
    sink: Arc<dyn EventSink>,
    scheduler: RefreshScheduler,
    tx: mpsc::Sender<EngineCommand>,
    train_options: TrainOptions,
    settle_delay: Duration,
    rng: StdRng,
}

impl EngineWorker {
    fn new(
        options: EngineOptions,
        source: Arc<dyn DataSource>,
        sink: Arc<dyn EventSink>,
        tx: mpsc::Sender<EngineCommand>,
    ) -> Self {
        let state = EngineState::new(options.category, options.timeframe, options.refresh);
        let sink: Arc<dyn EventSink> = Arc::new(RunIdSink::new(state.run_id.as_str(), sink));
        let tick_tx = tx.clone();
        let scheduler = RefreshScheduler::new(move |epoch| {
            let _ = tick_tx.send(EngineCommand::Tick { epoch });
        });
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        EngineWorker {
            state,
            source,
            sink,
            scheduler,
            tx,
            train_options: options.train,
            settle_delay: options.settle_delay,
            rng,
        }
    }

    fn run(mut self, rx: mpsc::Receiver<EngineCommand>) {
        self.start();
        while let Ok(command) = rx.recv() {
            if self.handle(command) == Flow::Stop {
                break;
            }
        }
    }

    /// Session startup: initial fetches, training, first prediction, timer.
    ///
    /// Fetches are issued before training so they overlap it; their
    /// completions queue up behind startup and are applied in the command
    /// loop.
    fn start(&mut self) {
        self.emit(
            EngineEvent::new(event_names::SESSION_STARTED, Phase::Session)
                .with_detail("category", self.state.category.name())
                .with_detail("timeframe", self.state.timeframe.name())
                .with_detail("refresh_enabled", self.state.refresh.enabled)
                .with_detail("interval_ms", self.state.refresh.interval.millis()),
        );
        self.spawn_chart_fetch();
        self.spawn_history_fetch();
        self.train_model();
        if self.state.model.is_ready() {
            self.prediction_cycle("startup");
        }
        if self.state.refresh.enabled {
            if let Some(epoch) = self.arm_timer() {
                self.emit(
                    EngineEvent::new(event_names::REFRESH_ENABLED, Phase::Refresh)
                        .with_detail("interval_ms", self.state.refresh.interval.millis())
                        .with_detail("epoch", epoch),
                );
            }
        }
    }

    fn handle(&mut self, command: EngineCommand) -> Flow {
        match command {
            EngineCommand::SwitchCategory(category) => self.switch_category(category),
            EngineCommand::SwitchTimeframe(timeframe) => self.switch_timeframe(timeframe),
            EngineCommand::ManualRefresh => self.manual_refresh(),
            EngineCommand::EnableRefresh(interval) => self.enable_refresh(interval),
            EngineCommand::DisableRefresh => self.disable_refresh(),
            EngineCommand::ChangeInterval(interval) => self.change_interval(interval),
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(EngineSnapshot::capture(&self.state));
            }
            EngineCommand::Shutdown => {
                self.scheduler.disable();
                self.emit(
                    EngineEvent::new(event_names::SESSION_ENDED, Phase::Session)
                        .with_detail("ticks", self.state.tick_count)
                        .with_detail("predictions", self.state.prediction_count)
                        .with_detail("stale_discarded", self.state.stale_discarded),
                );
                return Flow::Stop;
            }
            EngineCommand::Tick { epoch } => self.tick(epoch),
            EngineCommand::SettleElapsed { generation } => self.settle_elapsed(generation),
            EngineCommand::ChartFetched { generation, points } => {
                self.chart_fetched(generation, points)
            }
            EngineCommand::HistoryFetched { generation, series } => {
                self.history_fetched(generation, series)
            }
            EngineCommand::NotificationsFetched { generation, records } => {
                self.notifications_fetched(generation, records)
            }
        }
        Flow::Continue
    }

    fn train_model(&mut self) {
        self.state.model = ModelState::Training;
        self.emit(
            EngineEvent::new(event_names::MODEL_TRAINING_STARTED, Phase::Train)
                .with_detail("epochs", self.train_options.epochs),
        );
        match train(&builtin_training_set(), &self.train_options) {
            Ok((net, report)) => {
                info!(
                    final_loss = report.final_loss,
                    duration_ms = report.duration_ms,
                    "model trained"
                );
                self.emit(
                    EngineEvent::new(event_names::MODEL_TRAINING_COMPLETED, Phase::Train)
                        .with_detail("epochs_run", report.epochs_run)
                        .with_detail("final_loss", report.final_loss)
                        .with_detail("duration_ms", report.duration_ms)
                        .with_detail("parameter_count", report.parameter_count),
                );
                self.state.model = ModelState::Ready(net);
            }
            Err(err) => {
                error!(error = %err, "model training failed; predictions unavailable");
                self.emit(
                    EngineEvent::new(event_names::MODEL_TRAINING_FAILED, Phase::Train)
                        .with_detail("error", err.to_string()),
                );
                self.state.model = ModelState::Failed {
                    reason: err.to_string(),
                };
            }
        }
    }

    /// Generate a prediction, re-derive display state, and re-fetch the
    /// notification feed keyed to the new prediction.
    fn prediction_cycle(&mut self, trigger: &str) {
        let generated = {
            let Some(net) = self.state.model.net() else {
                return;
            };
            predict::generate(net, self.state.category, &mut self.rng)
        };
        let summary = derive::apply_prediction(&mut self.state, &generated, &mut self.rng);

        self.emit(
            EngineEvent::new(event_names::PREDICTION_GENERATED, Phase::Predict)
                .with_detail("category", self.state.category.name())
                .with_detail("value", generated.prediction.value)
                .with_detail("confidence", generated.prediction.confidence)
                .with_detail("fallback", generated.fallback)
                .with_detail("trigger", trigger),
        );
        self.emit(
            EngineEvent::new(event_names::DERIVED_STATE_UPDATED, Phase::Derive)
                .with_detail("band", summary.band)
                .with_detail("advice_index", summary.advice_index)
                .with_detail("alert_index", summary.alert_index),
        );
        self.emit(
            EngineEvent::new(event_names::HISTORY_APPENDED, Phase::Derive)
                .with_detail("len", self.state.history.len()),
        );
        self.spawn_notifications_fetch();
    }

    fn switch_category(&mut self, category: Category) {
        if category == self.state.category {
            debug!(category = %category, "category unchanged, ignoring switch");
            return;
        }
        let from = self.state.category;
        let generation = self.state.switch_category(category);
        self.emit(
            EngineEvent::new(event_names::CATEGORY_CHANGED, Phase::Session)
                .with_detail("from", from.name())
                .with_detail("to", category.name())
                .with_detail("generation", generation),
        );
        self.after_switch();
    }

    fn switch_timeframe(&mut self, timeframe: Timeframe) {
        if timeframe == self.state.timeframe {
            debug!(timeframe = %timeframe, "timeframe unchanged, ignoring switch");
            return;
        }
        let from = self.state.timeframe;
        let generation = self.state.switch_timeframe(timeframe);
        self.emit(
            EngineEvent::new(event_names::TIMEFRAME_CHANGED, Phase::Session)
                .with_detail("from", from.name())
                .with_detail("to", timeframe.name())
                .with_detail("generation", generation),
        );
        self.after_switch();
    }

    /// Common tail of both switches: re-fetch everything under the new
    /// generation, and schedule the settled re-prediction when a prediction
    /// already exists.
    fn after_switch(&mut self) {
        self.spawn_chart_fetch();
        self.spawn_history_fetch();
        if self.state.prediction.is_some() {
            self.spawn_notifications_fetch();
            self.spawn_settle();
        }
    }

    fn manual_refresh(&mut self) {
        if !self.state.model.is_ready() {
            self.emit(
                EngineEvent::new(event_names::TICK_SKIPPED, Phase::Refresh)
                    .with_detail("reason", "model_not_ready")
                    .with_detail("trigger", "manual"),
            );
            return;
        }
        self.emit(EngineEvent::new(event_names::MANUAL_REFRESH, Phase::Refresh));
        self.prediction_cycle("manual");
        // a manual refresh also re-fetches the chart; the running timer's
        // phase is left alone
        self.spawn_chart_fetch();
    }

    fn enable_refresh(&mut self, interval: RefreshInterval) {
        self.state.refresh.enabled = true;
        self.state.refresh.interval = interval;
        if let Some(epoch) = self.arm_timer() {
            self.emit(
                EngineEvent::new(event_names::REFRESH_ENABLED, Phase::Refresh)
                    .with_detail("interval_ms", interval.millis())
                    .with_detail("epoch", epoch),
            );
        }
    }

    fn disable_refresh(&mut self) {
        self.scheduler.disable();
        self.state.refresh.enabled = false;
        self.emit(EngineEvent::new(event_names::REFRESH_DISABLED, Phase::Refresh));
    }

    fn change_interval(&mut self, interval: RefreshInterval) {
        self.state.refresh.interval = interval;
        self.emit(
            EngineEvent::new(event_names::INTERVAL_CHANGED, Phase::Refresh)
                .with_detail("interval_ms", interval.millis()),
        );
        // a disabled scheduler keeps the new cadence for the next enable
        if self.state.refresh.enabled {
            self.arm_timer();
        }
    }

    fn arm_timer(&mut self) -> Option<u64> {
        match self
            .scheduler
            .enable(self.state.refresh.interval.duration())
        {
            Ok(epoch) => Some(epoch),
            Err(err) => {
                error!(error = %err, "failed to arm refresh timer");
                self.state.refresh.enabled = false;
                None
            }
        }
    }

    fn tick(&mut self, epoch: u64) {
        if !self.scheduler.accepts(epoch) {
            debug!(epoch, "tick from a disarmed timer, skipping");
            self.emit(
                EngineEvent::new(event_names::TICK_SKIPPED, Phase::Refresh)
                    .with_detail("reason", "stale_epoch")
                    .with_detail("epoch", epoch),
            );
            return;
        }
        self.state.tick_count += 1;
        self.emit(
            EngineEvent::new(event_names::TICK_FIRED, Phase::Refresh)
                .with_detail("tick", self.state.tick_count)
                .with_detail("epoch", epoch),
        );
        if self.state.model.is_ready() {
            self.prediction_cycle("tick");
        } else {
            self.emit(
                EngineEvent::new(event_names::TICK_SKIPPED, Phase::Refresh)
                    .with_detail("reason", "model_not_ready"),
            );
        }
    }

    fn settle_elapsed(&mut self, generation: u64) {
        if !self.state.is_current(generation) {
            debug!(
                generation,
                current = self.state.generation,
                "settle timer from a superseded switch, ignoring"
            );
            return;
        }
        if self.state.model.is_ready() {
            self.prediction_cycle("settle");
        }
    }

    fn chart_fetched(&mut self, generation: u64, points: Vec<ChartPoint>) {
        if !self.state.is_current(generation) {
            self.discard_stale("chart", generation);
            return;
        }
        let count = points.len();
        self.state.chart = points;
        if count == 0 {
            self.emit(
                EngineEvent::new(event_names::FETCH_FAILED, Phase::Source)
                    .with_detail("kind", "chart"),
            );
        } else {
            self.emit(
                EngineEvent::new(event_names::CHART_UPDATED, Phase::Source)
                    .with_detail("points", count),
            );
        }
    }

    fn history_fetched(&mut self, generation: u64, series: Vec<HistoryEntry>) {
        if !self.state.is_current(generation) {
            self.discard_stale("history", generation);
            return;
        }
        let count = series.len();
        self.state.history.replace_all(series);
        if count == 0 {
            self.emit(
                EngineEvent::new(event_names::FETCH_FAILED, Phase::Source)
                    .with_detail("kind", "history"),
            );
        } else {
            self.emit(
                EngineEvent::new(event_names::HISTORY_REPLACED, Phase::Source)
                    .with_detail("len", self.state.history.len()),
            );
        }
    }

    fn notifications_fetched(&mut self, generation: u64, records: Vec<NotificationRecord>) {
        if !self.state.is_current(generation) {
            self.discard_stale("notifications", generation);
            return;
        }
        let count = records.len();
        self.state.notifications = records;
        if count == 0 {
            self.emit(
                EngineEvent::new(event_names::FETCH_FAILED, Phase::Source)
                    .with_detail("kind", "notifications"),
            );
        } else {
            self.emit(
                EngineEvent::new(event_names::NOTIFICATIONS_UPDATED, Phase::Source)
                    .with_detail("count", count),
            );
        }
    }

    fn discard_stale(&mut self, kind: &str, generation: u64) {
        self.state.record_stale();
        warn!(
            kind,
            generation,
            current = self.state.generation,
            "discarding stale completion"
        );
        self.emit(
            EngineEvent::new(event_names::STALE_RESULT_DISCARDED, Phase::Source)
                .with_detail("kind", kind)
                .with_detail("generation", generation)
                .with_detail("current_generation", self.state.generation),
        );
    }

    fn spawn_chart_fetch(&self) {
        let generation = self.state.generation;
        let category = self.state.category;
        let timeframe = self.state.timeframe;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.spawn_worker("bcp-fetch-chart", move || {
            let points = source.chart_data(category, timeframe);
            let _ = tx.send(EngineCommand::ChartFetched { generation, points });
        });
    }

    fn spawn_history_fetch(&self) {
        let generation = self.state.generation;
        let category = self.state.category;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.spawn_worker("bcp-fetch-history", move || {
            let series = source.history_series(category);
            let _ = tx.send(EngineCommand::HistoryFetched { generation, series });
        });
    }

    fn spawn_notifications_fetch(&self) {
        let Some(prediction) = self.state.prediction else {
            return;
        };
        let generation = self.state.generation;
        let category = self.state.category;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.spawn_worker("bcp-fetch-notifications", move || {
            let records = source.notifications(category, &prediction);
            let _ = tx.send(EngineCommand::NotificationsFetched { generation, records });
        });
    }

    fn spawn_settle(&self) {
        let generation = self.state.generation;
        let delay = self.settle_delay;
        let tx = self.tx.clone();
        self.spawn_worker("bcp-settle", move || {
            thread::sleep(delay);
            let _ = tx.send(EngineCommand::SettleElapsed { generation });
        });
    }

    fn spawn_worker(&self, name: &str, body: impl FnOnce() + Send + 'static) {
        let spawned = thread::Builder::new().name(name.to_string()).spawn(body);
        if let Err(err) = spawned {
            error!(worker = name, error = %err, "failed to spawn worker thread");
        }
    }

    fn emit(&self, event: EngineEvent) {
        self.sink.emit(event);
    }
}
