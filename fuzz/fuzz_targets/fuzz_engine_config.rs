//! Fuzz target for engine.json configuration parsing.
//!
//! Tests that JSON engine configuration parsing handles arbitrary input
//! without panicking.

#![no_main]

use bcp_common::EngineConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to parse as JSON - should never panic, only return an error
    if let Ok(config) = serde_json::from_slice::<EngineConfig>(data) {
        // Validation of a parsed config must not panic either
        let _ = config.validate();
    }
});
