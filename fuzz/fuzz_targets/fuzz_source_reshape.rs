//! Fuzz target for source document reshaping.
//!
//! Tests that every reshaper walks arbitrary JSON documents without
//! panicking. Reshapers are tolerant by contract: malformed or missing
//! fields must degrade to zero or empty, never fail.

#![no_main]

use bcp_common::{Category, Prediction, Timeframe};
use bcp_sources::reshape;
use bcp_sources::PerformerScope;
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    // Seeded RNG keeps each input reproducible
    let mut rng = StdRng::seed_from_u64(0);
    let prediction = Prediction::from_value(0.7);

    for category in Category::ALL {
        let _ = reshape::chart(category, Timeframe::Weekly, &doc, &mut rng);
        let _ = reshape::notifications(&doc, category, &prediction, &mut rng);
        let _ = reshape::performers(&doc, PerformerScope::Category(category), &mut rng);
    }
    let _ = reshape::history(&doc, &mut rng);
    let _ = reshape::performers(&doc, PerformerScope::Overall, &mut rng);
});
