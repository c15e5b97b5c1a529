//! Configuration resolution for the predictor.
//!
//! Implements deterministic config resolution order:
//! 1. Explicit CLI flag (--config)
//! 2. Environment variable (BCP_CONFIG)
//! 3. XDG default (~/.config/bizcrm_predictor/engine.json)
//! 4. Built-in defaults

use std::env;
use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::{ConfigResolution, ConfigSource, EngineConfig};
use crate::error::{Error, Result};

/// Name of the engine config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "engine.json";

/// Configuration file paths from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit path to engine.json
    pub config_path: Option<PathBuf>,
}

/// Configuration resolver with deterministic resolution order.
#[derive(Debug)]
pub struct ConfigResolver {
    cli_paths: ConfigPaths,
}

impl ConfigResolver {
    /// Create a new resolver with CLI paths.
    pub fn new(paths: ConfigPaths) -> Self {
        ConfigResolver { cli_paths: paths }
    }

    /// Create a resolver with no CLI overrides.
    pub fn with_defaults() -> Self {
        ConfigResolver {
            cli_paths: ConfigPaths::default(),
        }
    }

    /// Resolve the engine.json path.
    pub fn resolve_config_path(&self) -> (Option<PathBuf>, ConfigResolution) {
        // 1. CLI flag
        if let Some(ref path) = self.cli_paths.config_path {
            return (Some(path.clone()), ConfigResolution::CliFlag);
        }

        // 2. BCP_CONFIG env var
        if let Ok(path) = env::var("BCP_CONFIG") {
            return (Some(PathBuf::from(path)), ConfigResolution::EnvVar);
        }

        // 3. XDG config dir
        if let Some(config_dir) = resolve_config_dir() {
            let path = config_dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                return (Some(path), ConfigResolution::XdgConfig);
            }
        }

        // 4. Default
        (None, ConfigResolution::Default)
    }

    /// Load the engine config from the resolved path, or defaults.
    ///
    /// A path that was explicitly requested (CLI or env) must exist and
    /// parse; a missing XDG file silently falls back to defaults.
    pub fn load_engine(&self) -> Result<(EngineConfig, ConfigSource)> {
        let (path, resolution) = self.resolve_config_path();

        match path {
            Some(p) => {
                let content = fs::read_to_string(&p).map_err(|e| {
                    Error::Config(format!("failed to read config from {}: {}", p.display(), e))
                })?;

                let hash = compute_sha256(&content);

                let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", p.display(), e))
                })?;

                Ok((
                    config,
                    ConfigSource {
                        path: Some(p.to_string_lossy().to_string()),
                        hash: Some(hash),
                        resolution,
                    },
                ))
            }
            None => Ok((
                EngineConfig::default(),
                ConfigSource {
                    path: None,
                    hash: None,
                    resolution: ConfigResolution::Default,
                },
            )),
        }
    }
}

/// Resolve the config directory, honoring XDG_CONFIG_HOME.
fn resolve_config_dir() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("bizcrm_predictor"));
    }
    dirs::config_dir().map(|d| d.join("bizcrm_predictor"))
}

/// SHA-256 hex digest of file contents.
pub fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
