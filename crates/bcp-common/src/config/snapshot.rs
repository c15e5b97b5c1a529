//! Configuration snapshots for audit and `bcp check`.
//!
//! Captures a complete record of the active configuration including file
//! path, content hash, resolution method, and effective values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resolve::compute_sha256;
use super::{ConfigResolution, ConfigSource, EngineConfig};
use crate::error::Result;

/// Complete configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Timestamp when snapshot was created
    pub snapshot_at: DateTime<Utc>,

    /// Hash of the effective (post-default) configuration
    pub effective_hash: String,

    /// Where the config came from
    pub source: SourceInfo,

    /// Active schema version
    pub schema_version: String,
}

impl ConfigSnapshot {
    /// Create a new snapshot from a loaded config.
    pub fn new(config: &EngineConfig, source: ConfigSource) -> Result<Self> {
        let effective_json = serde_json::to_string(config)?;

        Ok(ConfigSnapshot {
            snapshot_at: Utc::now(),
            effective_hash: compute_sha256(&effective_json),
            source: SourceInfo::from_config_source(source),
            schema_version: config.schema_version.clone(),
        })
    }

    /// Create a snapshot for built-in defaults.
    pub fn from_defaults(config: &EngineConfig) -> Result<Self> {
        ConfigSnapshot::new(
            config,
            ConfigSource {
                path: None,
                hash: None,
                resolution: ConfigResolution::Default,
            },
        )
    }

    /// Return true if the config came from built-in defaults.
    pub fn is_default(&self) -> bool {
        self.source.resolution == "default"
    }

    /// Return the snapshot as a JSON value for event payloads.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "snapshot_at": self.snapshot_at.to_rfc3339(),
            "effective_hash": self.effective_hash,
            "source": {
                "path": self.source.path,
                "hash": self.source.hash,
                "resolution": self.source.resolution,
            },
            "schema_version": self.schema_version,
        })
    }
}

/// Source information for the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Path to the file (None if defaults)
    pub path: Option<String>,

    /// SHA-256 hash of file content (None if defaults)
    pub hash: Option<String>,

    /// How the config was resolved ("cli", "env", "xdg", "default")
    pub resolution: String,
}

impl SourceInfo {
    fn from_config_source(source: ConfigSource) -> Self {
        SourceInfo {
            path: source.path,
            hash: source.hash,
            resolution: source.resolution.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_marked_default() {
        let config = EngineConfig::default();
        let snapshot = ConfigSnapshot::from_defaults(&config).unwrap();
        assert!(snapshot.is_default());
        assert!(snapshot.source.path.is_none());
        assert_eq!(snapshot.schema_version, super::super::CONFIG_SCHEMA_VERSION);
    }

    #[test]
    fn snapshot_hash_tracks_effective_values() {
        let a = ConfigSnapshot::from_defaults(&EngineConfig::default()).unwrap();
        let mut changed = EngineConfig::default();
        changed.refresh.enabled = false;
        let b = ConfigSnapshot::from_defaults(&changed).unwrap();
        assert_ne!(a.effective_hash, b.effective_hash);
    }

    #[test]
    fn snapshot_json_shape() {
        let snapshot = ConfigSnapshot::from_defaults(&EngineConfig::default()).unwrap();
        let value = snapshot.to_json();
        assert!(value["effective_hash"].is_string());
        assert_eq!(value["source"]["resolution"], "default");
    }
}
