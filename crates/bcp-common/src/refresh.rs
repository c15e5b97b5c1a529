//! Auto-refresh intervals and configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Error;

/// The closed set of supported auto-refresh intervals.
///
/// Serialized as raw milliseconds; any millisecond value outside this set
/// fails to deserialize, which keeps config files honest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(try_from = "u64", into = "u64")]
pub enum RefreshInterval {
    #[default]
    #[value(name = "1m")]
    OneMinute,
    #[value(name = "5m")]
    FiveMinutes,
    #[value(name = "15m")]
    FifteenMinutes,
    #[value(name = "30m")]
    ThirtyMinutes,
    #[value(name = "1h")]
    OneHour,
    #[value(name = "5h")]
    FiveHours,
}

impl RefreshInterval {
    /// All intervals in ascending order.
    pub const ALL: [RefreshInterval; 6] = [
        RefreshInterval::OneMinute,
        RefreshInterval::FiveMinutes,
        RefreshInterval::FifteenMinutes,
        RefreshInterval::ThirtyMinutes,
        RefreshInterval::OneHour,
        RefreshInterval::FiveHours,
    ];

    pub fn millis(&self) -> u64 {
        match self {
            RefreshInterval::OneMinute => 60_000,
            RefreshInterval::FiveMinutes => 300_000,
            RefreshInterval::FifteenMinutes => 900_000,
            RefreshInterval::ThirtyMinutes => 1_800_000,
            RefreshInterval::OneHour => 3_600_000,
            RefreshInterval::FiveHours => 18_000_000,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis())
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            RefreshInterval::OneMinute => "1 minute",
            RefreshInterval::FiveMinutes => "5 minutes",
            RefreshInterval::FifteenMinutes => "15 minutes",
            RefreshInterval::ThirtyMinutes => "30 minutes",
            RefreshInterval::OneHour => "1 hour",
            RefreshInterval::FiveHours => "5 hours",
        }
    }

    pub fn from_millis(millis: u64) -> Option<Self> {
        RefreshInterval::ALL
            .iter()
            .copied()
            .find(|interval| interval.millis() == millis)
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = Error;

    fn try_from(millis: u64) -> Result<Self, Error> {
        RefreshInterval::from_millis(millis).ok_or(Error::InvalidInterval { millis })
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> u64 {
        interval.millis()
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Auto-refresh behavior for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Whether the periodic refresh timer runs at all.
    pub enabled: bool,
    /// Cadence of the timer when enabled.
    #[serde(rename = "interval_ms")]
    pub interval: RefreshInterval,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            enabled: true,
            interval: RefreshInterval::OneMinute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_interval_set_is_closed() {
        let millis: Vec<u64> = RefreshInterval::ALL.iter().map(|i| i.millis()).collect();
        assert_eq!(
            millis,
            vec![60_000, 300_000, 900_000, 1_800_000, 3_600_000, 18_000_000]
        );
        assert!(RefreshInterval::from_millis(120_000).is_none());
        assert!(RefreshInterval::from_millis(0).is_none());
    }

    #[test]
    fn serde_rejects_values_outside_the_set() {
        let ok: RefreshInterval = serde_json::from_str("300000").unwrap();
        assert_eq!(ok, RefreshInterval::FiveMinutes);
        assert!(serde_json::from_str::<RefreshInterval>("61000").is_err());
    }

    #[test]
    fn serde_writes_raw_millis() {
        let json = serde_json::to_string(&RefreshInterval::OneHour).unwrap();
        assert_eq!(json, "3600000");
    }

    #[test]
    fn refresh_config_defaults_to_one_minute_enabled() {
        let config = RefreshConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, RefreshInterval::OneMinute);
    }

    #[test]
    fn refresh_config_fills_missing_fields() {
        let config: RefreshConfig = serde_json::from_str("{\"enabled\": false}").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.interval, RefreshInterval::OneMinute);
    }
}
