//! Configuration loading and validation for the predictor engine.
//!
//! This module provides:
//! - The typed structure for engine.json
//! - Deterministic config resolution (CLI > env > XDG > defaults)
//! - Semantic validation
//! - Config snapshots for audit and `bcp check`

pub mod resolve;
pub mod snapshot;

pub use resolve::{ConfigPaths, ConfigResolver};
pub use snapshot::ConfigSnapshot;

use serde::{Deserialize, Serialize};

use crate::category::{Category, Timeframe};
use crate::error::{Error, Result};
use crate::refresh::RefreshConfig;

/// Schema version for engine.json.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Complete engine configuration, as loaded from engine.json.
///
/// Every section has defaults, so a partial file (or no file at all) still
/// yields a runnable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub schema_version: String,
    pub refresh: RefreshConfig,
    pub defaults: EngineDefaults,
    pub source: SourceConfig,
    pub export: ExportConfig,
}

/// Category and timeframe the engine starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    pub category: Category,
    pub timeframe: Timeframe,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        EngineDefaults {
            category: Category::Ticket,
            timeframe: Timeframe::Weekly,
        }
    }
}

/// Remote data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL for the demo data service.
    pub base_url: String,
    /// Hard cap on any single response body.
    pub max_response_bytes: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: "https://dummyjson.com".to_string(),
            max_response_bytes: 1_048_576,
        }
    }
}

/// Export artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export artifacts are written into, created on demand.
    pub dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            dir: "exports".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            refresh: RefreshConfig::default(),
            defaults: EngineDefaults::default(),
            source: SourceConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with resolution from CLI, env, or defaults.
    pub fn load(resolver: &ConfigResolver) -> Result<(Self, ConfigSnapshot)> {
        let (config, source) = resolver.load_engine()?;
        config.validate()?;
        let snapshot = ConfigSnapshot::new(&config, source)?;
        Ok((config, snapshot))
    }

    /// Built-in defaults, used when no config file is found.
    pub fn load_defaults() -> Result<(Self, ConfigSnapshot)> {
        let config = EngineConfig::default();
        let snapshot = ConfigSnapshot::from_defaults(&config)?;
        Ok((config, snapshot))
    }

    /// Validate configuration semantically.
    ///
    /// Interval membership is already enforced at the serde boundary; this
    /// checks the rest.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(Error::ConfigVersion {
                expected: CONFIG_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        if !self.source.base_url.starts_with("http://") && !self.source.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "source.base_url must be an http(s) URL, got {:?}",
                self.source.base_url
            )));
        }
        let host = self
            .source
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        if host.trim_end_matches('/').is_empty() {
            return Err(Error::Config(
                "source.base_url must include a host".to_string(),
            ));
        }
        if self.source.max_response_bytes < 1024 {
            return Err(Error::Config(format!(
                "source.max_response_bytes must be at least 1024, got {}",
                self.source.max_response_bytes
            )));
        }
        if self.export.dir.trim().is_empty() {
            return Err(Error::Config("export.dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration source for the loaded file.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file, or None if using defaults
    pub path: Option<String>,
    /// SHA-256 hash of file contents, or None if defaults
    pub hash: Option<String>,
    /// How this source was resolved
    pub resolution: ConfigResolution,
}

/// How the config file was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigResolution {
    /// From explicit CLI flag
    CliFlag,
    /// From environment variable
    EnvVar,
    /// From XDG config directory
    XdgConfig,
    /// Using built-in defaults
    Default,
}

impl std::fmt::Display for ConfigResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigResolution::CliFlag => write!(f, "cli"),
            ConfigResolution::EnvVar => write!(f, "env"),
            ConfigResolution::XdgConfig => write!(f, "xdg"),
            ConfigResolution::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::RefreshInterval;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.defaults.category, Category::Ticket);
        assert_eq!(config.defaults.timeframe, Timeframe::Weekly);
        assert_eq!(config.refresh.interval, RefreshInterval::OneMinute);
    }

    #[test]
    fn partial_file_fills_from_defaults() {
        let json = r#"{ "refresh": { "interval_ms": 900000 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.refresh.interval, RefreshInterval::FifteenMinutes);
        assert!(config.refresh.enabled);
        assert_eq!(config.source.base_url, "https://dummyjson.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn interval_outside_the_set_fails_to_parse() {
        let json = r#"{ "refresh": { "interval_ms": 61000 } }"#;
        assert!(serde_json::from_str::<EngineConfig>(json).is_err());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let config = EngineConfig {
            schema_version: "0.9.0".to_string(),
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(Error::ConfigVersion { expected, actual }) => {
                assert_eq!(expected, CONFIG_SCHEMA_VERSION);
                assert_eq!(actual, "0.9.0");
            }
            other => panic!("expected ConfigVersion error, got {other:?}"),
        }
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let mut config = EngineConfig::default();
        config.source.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_response_cap_is_rejected() {
        let mut config = EngineConfig::default();
        config.source.max_response_bytes = 100;
        assert!(config.validate().is_err());
    }
}
