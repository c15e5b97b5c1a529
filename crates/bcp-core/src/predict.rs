//! Prediction generation per category.
//!
//! Only the ticket category consults the trained network; sales and enquiry
//! values are uniform draws (no model exists for them upstream, preserved
//! as-is). An inference failure falls back to a uniform draw for that cycle
//! and is never fatal.

use bcp_common::{Category, Prediction};
use bcp_model::PriorityNet;
use rand::Rng;
use tracing::warn;

/// Feature draw for a ticket prediction.
///
/// `chargeable` and `region` are booleans encoded as 0.0/1.0 by
/// thresholding a uniform draw at 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TicketFeatures {
    pub complaint_type: f32,
    pub chargeable: f32,
    pub completion_time: f32,
    pub region: f32,
}

impl TicketFeatures {
    pub fn draw(rng: &mut impl Rng) -> Self {
        Self {
            complaint_type: rng.random::<f32>(),
            chargeable: if rng.random::<f64>() > 0.5 { 1.0 } else { 0.0 },
            completion_time: rng.random::<f32>(),
            region: if rng.random::<f64>() > 0.5 { 1.0 } else { 0.0 },
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [
            self.complaint_type,
            self.chargeable,
            self.completion_time,
            self.region,
        ]
    }
}

/// Outcome of one prediction cycle.
#[derive(Debug, Clone)]
pub struct GeneratedPrediction {
    pub prediction: Prediction,
    /// True when inference failed and the value is a uniform fallback draw.
    pub fallback: bool,
}

/// Generate a prediction for the category.
pub fn generate(
    net: &PriorityNet,
    category: Category,
    rng: &mut impl Rng,
) -> GeneratedPrediction {
    match category {
        Category::Ticket => {
            let features = TicketFeatures::draw(rng);
            match net.predict(&features.as_array()) {
                Ok(value) => GeneratedPrediction {
                    prediction: Prediction::from_value(value),
                    fallback: false,
                },
                Err(err) => {
                    warn!(error = %err, "inference failed, falling back to a random draw");
                    GeneratedPrediction {
                        prediction: Prediction::from_value(rng.random::<f64>()),
                        fallback: true,
                    }
                }
            }
        }
        Category::Sales | Category::Enquiry => GeneratedPrediction {
            prediction: Prediction::from_value(rng.random::<f64>()),
            fallback: false,
        },
    }
}
