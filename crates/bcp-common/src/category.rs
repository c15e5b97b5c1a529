//! Prediction categories and display timeframes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business area a prediction applies to.
///
/// The category selects the data endpoints, the advice/alert tables, and
/// (for tickets) whether the trained model is consulted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Support ticket priority.
    Ticket,
    /// Sales growth outlook.
    Sales,
    /// Enquiry conversion potential.
    Enquiry,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Ticket, Category::Sales, Category::Enquiry];

    /// Short wire name, matching config files and CLI values.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Ticket => "ticket",
            Category::Sales => "sales",
            Category::Enquiry => "enquiry",
        }
    }

    /// Human-facing title for report headers.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Ticket => "Ticket Priority",
            Category::Sales => "Sales Growth",
            Category::Enquiry => "Enquiry Conversion",
        }
    }

    /// Chart heading for the category's display data.
    pub fn chart_title(&self) -> &'static str {
        match self {
            Category::Ticket => "Ticket Distribution by Type",
            Category::Sales => "Sales Performance",
            Category::Enquiry => "Enquiry Volume by Type",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display scaling window for chart and history values.
///
/// The timeframe scales displayed magnitudes only. Prediction inputs and
/// outputs are never multiplied by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Weekly,
    Monthly,
    Quarterly,
}

impl Timeframe {
    /// All timeframes in ascending window order.
    pub const ALL: [Timeframe; 3] = [Timeframe::Weekly, Timeframe::Monthly, Timeframe::Quarterly];

    /// Multiplier applied to displayed values for this window.
    ///
    /// Weekly is the base unit; monthly and quarterly scale it by the
    /// number of weeks-equivalents in the window (4 and 12).
    pub fn multiplier(&self) -> f64 {
        match self {
            Timeframe::Weekly => 1.0,
            Timeframe::Monthly => 4.0,
            Timeframe::Quarterly => 12.0,
        }
    }

    /// Short wire name, matching config files and CLI values.
    pub fn name(&self) -> &'static str {
        match self {
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_match_window_lengths() {
        assert_eq!(Timeframe::Weekly.multiplier(), 1.0);
        assert_eq!(Timeframe::Monthly.multiplier(), 4.0);
        assert_eq!(Timeframe::Quarterly.multiplier(), 12.0);
    }

    #[test]
    fn category_wire_names_round_trip() {
        for cat in Category::ALL {
            let json = serde_json::to_string(&cat).unwrap();
            let back: Category = serde_json::from_str(&json).unwrap();
            assert_eq!(back, cat);
        }
        assert_eq!(serde_json::to_string(&Category::Ticket).unwrap(), "\"ticket\"");
    }

    #[test]
    fn timeframe_wire_names_round_trip() {
        for tf in Timeframe::ALL {
            let json = serde_json::to_string(&tf).unwrap();
            let back: Timeframe = serde_json::from_str(&json).unwrap();
            assert_eq!(back, tf);
        }
    }
}
