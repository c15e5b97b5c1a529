//! Prediction values, confidence, and banded labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Which side of the 0.5 decision boundary a prediction falls on.
///
/// A value of exactly 0.5 is Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Low,
}

impl Band {
    pub fn is_high(&self) -> bool {
        matches!(self, Band::High)
    }
}

/// A single model prediction.
///
/// `value` is the raw sigmoid output in [0, 1]. `confidence` measures the
/// distance from the 0.5 decision boundary rescaled to 0..=100, so a coin
/// flip reports 0 and a saturated output reports 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    pub confidence: u8,
    pub generated_at: DateTime<Utc>,
}

impl Prediction {
    /// Build a prediction from a raw model output, deriving confidence.
    pub fn from_value(value: f64) -> Self {
        Prediction {
            value,
            confidence: confidence_percent(value),
            generated_at: Utc::now(),
        }
    }

    pub fn band(&self) -> Band {
        if self.value > 0.5 {
            Band::High
        } else {
            Band::Low
        }
    }

    /// Category-specific outcome label for this prediction.
    pub fn label(&self, category: Category) -> &'static str {
        band_label(category, self.band())
    }
}

/// Distance from the 0.5 boundary rescaled to a 0..=100 percentage.
pub fn confidence_percent(value: f64) -> u8 {
    let pct = ((value - 0.5).abs() * 200.0).round();
    pct.min(100.0) as u8
}

/// Outcome label for a band within a category.
pub fn band_label(category: Category, band: Band) -> &'static str {
    match (category, band) {
        (Category::Ticket, Band::High) => "High Priority",
        (Category::Ticket, Band::Low) => "Low Priority",
        (Category::Sales, Band::High) => "Strong Growth Expected",
        (Category::Sales, Band::Low) => "Moderate Growth Expected",
        (Category::Enquiry, Band::High) => "High Conversion Potential",
        (Category::Enquiry, Band::Low) => "Low Conversion Potential",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn confidence_is_zero_at_the_boundary() {
        assert_eq!(confidence_percent(0.5), 0);
    }

    #[test]
    fn confidence_saturates_at_the_extremes() {
        assert_eq!(confidence_percent(0.0), 100);
        assert_eq!(confidence_percent(1.0), 100);
    }

    #[test]
    fn confidence_examples() {
        assert_eq!(confidence_percent(0.75), 50);
        assert_eq!(confidence_percent(0.25), 50);
        assert_eq!(confidence_percent(0.6), 20);
        assert_eq!(confidence_percent(0.51), 2);
    }

    #[test]
    fn exact_boundary_is_low_band() {
        let p = Prediction::from_value(0.5);
        assert_eq!(p.band(), Band::Low);
        assert_eq!(p.label(Category::Ticket), "Low Priority");
    }

    #[test]
    fn labels_follow_band_per_category() {
        let high = Prediction::from_value(0.9);
        let low = Prediction::from_value(0.1);
        assert_eq!(high.label(Category::Sales), "Strong Growth Expected");
        assert_eq!(low.label(Category::Sales), "Moderate Growth Expected");
        assert_eq!(high.label(Category::Enquiry), "High Conversion Potential");
        assert_eq!(low.label(Category::Enquiry), "Low Conversion Potential");
    }

    proptest! {
        #[test]
        fn confidence_in_range(value in 0.0_f64..=1.0) {
            let c = confidence_percent(value);
            prop_assert!(c <= 100);
        }

        #[test]
        fn confidence_is_symmetric(value in 0.0_f64..=0.5) {
            prop_assert_eq!(confidence_percent(value), confidence_percent(1.0 - value));
        }

        #[test]
        fn confidence_grows_with_distance(a in 0.5_f64..=1.0, b in 0.5_f64..=1.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(confidence_percent(near) <= confidence_percent(far));
        }
    }
}
