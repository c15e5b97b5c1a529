//! BizCRM Predictor common types, IDs, and errors.
//!
//! This crate provides foundational types shared across bcp crates:
//! - Prediction values, confidence, and banded labels
//! - Category and timeframe domain enums
//! - Bounded prediction history
//! - The closed set of auto-refresh intervals
//! - Common error types
//! - Output format specifications
//! - Configuration loading and validation

pub mod category;
pub mod config;
pub mod error;
pub mod history;
pub mod id;
pub mod output;
pub mod prediction;
pub mod refresh;

pub use category::{Category, Timeframe};
pub use config::{ConfigPaths, ConfigResolver, ConfigSnapshot, EngineConfig, CONFIG_SCHEMA_VERSION};
pub use error::{Error, Result};
pub use history::{HistoryEntry, PredictionHistory, HISTORY_CAPACITY};
pub use id::RunId;
pub use output::OutputFormat;
pub use prediction::{Band, Prediction};
pub use refresh::{RefreshConfig, RefreshInterval};
