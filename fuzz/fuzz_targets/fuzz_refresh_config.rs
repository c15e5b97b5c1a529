//! Fuzz target for refresh interval deserialization.
//!
//! The interval set is closed at the serde boundary: any millisecond value
//! outside it must fail to parse rather than panic or slip through.

#![no_main]

use bcp_common::{RefreshConfig, RefreshInterval};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(interval) = serde_json::from_slice::<RefreshInterval>(data) {
        // Anything that parsed must round-trip through the closed set
        assert!(RefreshInterval::from_millis(interval.millis()).is_some());
    }
    if let Ok(config) = serde_json::from_slice::<RefreshConfig>(data) {
        assert!(RefreshInterval::from_millis(config.interval.millis()).is_some());
    }
});
