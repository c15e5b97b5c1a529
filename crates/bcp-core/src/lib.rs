//! BizCRM Predictor Core Library
//!
//! This library provides the prediction engine:
//! - Model lifecycle (train once per session, predict per cycle)
//! - Per-category prediction and derived advice/alert state
//! - Refresh scheduling with epoch-tagged ticks
//! - Engine thread with generation-stamped fetch completions
//! - Output rendering and export artifacts
//!
//! The binary entry point is in `main.rs`.

pub mod advice;
pub mod derive;
pub mod engine;
pub mod events;
pub mod exit_codes;
pub mod export;
pub mod logging;
pub mod output;
pub mod predict;
pub mod scheduler;
pub mod state;

pub use engine::{Engine, EngineCommand, EngineOptions, SETTLE_DELAY};
pub use events::{EngineEvent, EventBus, EventSink};
pub use exit_codes::ExitCode;
pub use state::{EngineSnapshot, EngineState, ModelPhase, ModelState};
