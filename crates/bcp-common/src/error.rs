//! Error types for the BizCRM predictor.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! Errors can be formatted for human consumption with headline, reason, and fix:
//! ```text
//! ✗ Training Failed
//!   Reason: model training failed: loss diverged at epoch 12
//!   Fix: Re-run with BCP_LOG=debug to capture per-epoch loss
//! ```
//!
//! # Machine-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 11,
//!   "category": "config",
//!   "message": "unsupported refresh interval: 61000ms is not in the allowed set",
//!   "recoverable": true,
//!   "context": { "millis": 61000 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for predictor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Remote data source fetch and decode errors.
    Source,
    /// Model training and inference errors.
    Model,
    /// Engine lifecycle errors.
    Engine,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Engine => write!(f, "engine"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Errors produced anywhere in the predictor.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported refresh interval: {millis}ms is not in the allowed set")]
    InvalidInterval { millis: u64 },

    #[error("config schema version mismatch: expected {expected}, got {actual}")]
    ConfigVersion { expected: String, actual: String },

    // Source errors (20-29)
    #[error("source fetch failed: {0}")]
    Source(String),

    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    // Model errors (30-39)
    #[error("model training failed: {0}")]
    TrainingFailed(String),

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("no trained model available")]
    ModelUnavailable,

    // Engine errors (40-49)
    #[error("engine command channel closed")]
    EngineClosed,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Source errors
    /// - 30-39: Model errors
    /// - 40-49: Engine errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidInterval { .. } => 11,
            Error::ConfigVersion { .. } => 12,
            Error::Source(_) => 20,
            Error::ResponseTooLarge { .. } => 21,
            Error::TrainingFailed(_) => 30,
            Error::NumericalInstability(_) => 31,
            Error::InferenceFailed(_) => 32,
            Error::ModelUnavailable => 33,
            Error::EngineClosed => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidInterval { .. } | Error::ConfigVersion { .. } => {
                ErrorCategory::Config
            }
            Error::Source(_) | Error::ResponseTooLarge { .. } => ErrorCategory::Source,
            Error::TrainingFailed(_)
            | Error::NumericalInstability(_)
            | Error::InferenceFailed(_)
            | Error::ModelUnavailable => ErrorCategory::Model,
            Error::EngineClosed => ErrorCategory::Engine,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether the operation can sensibly be retried or degraded.
    ///
    /// Inference failures are recoverable: the engine substitutes a random
    /// draw for that cycle. Training failures are not: the session keeps
    /// running but predictions stay unavailable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidInterval { .. } | Error::ConfigVersion { .. } => true,
            Error::Source(_) | Error::ResponseTooLarge { .. } => true,
            Error::TrainingFailed(_) | Error::NumericalInstability(_) => false,
            Error::InferenceFailed(_) => true,
            Error::ModelUnavailable => false,
            Error::EngineClosed => false,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Human remediation hint for CLI error output.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'bcp check' to validate the config file, or remove it to use defaults",
            Error::InvalidInterval { .. } => {
                "Use one of: 60000, 300000, 900000, 1800000, 3600000, 18000000"
            }
            Error::ConfigVersion { .. } => {
                "Regenerate the config file or update its schema_version field"
            }
            Error::Source(_) => "Check network connectivity and the configured base URL",
            Error::ResponseTooLarge { .. } => {
                "Raise source.max_response_bytes in the config, or lower the request limit"
            }
            Error::TrainingFailed(_) => "Re-run with BCP_LOG=debug to capture per-epoch loss",
            Error::NumericalInstability(_) => {
                "Re-run training; if it persists, lower the learning rate"
            }
            Error::InferenceFailed(_) => {
                "The engine substitutes a random draw for this cycle; no action needed"
            }
            Error::ModelUnavailable => "Run 'bcp train' or restart the engine to retrain",
            Error::EngineClosed => "Restart the engine",
            Error::Io(_) => "Check file permissions and available disk space",
            Error::Json(_) => "This is a bug in the predictor; please report it",
        }
    }

    /// Short headline for human error output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidInterval { .. } => "Unsupported Refresh Interval",
            Error::ConfigVersion { .. } => "Config Version Mismatch",
            Error::Source(_) => "Source Fetch Error",
            Error::ResponseTooLarge { .. } => "Response Too Large",
            Error::TrainingFailed(_) => "Training Failed",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::InferenceFailed(_) => "Inference Failed",
            Error::ModelUnavailable => "Model Unavailable",
            Error::EngineClosed => "Engine Stopped",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "Serialization Error",
        }
    }
}

/// Structured error for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., interval millis, file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidInterval { millis } => {
                context.insert("millis".to_string(), serde_json::json!(millis));
            }
            Error::ConfigVersion { expected, actual } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::ResponseTooLarge { limit } => {
                context.insert("limit".to_string(), serde_json::json!(limit));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Attach additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"code\":{}}}", self.code))
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
