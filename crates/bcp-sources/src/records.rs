//! Structural records produced by the fetchers.
//!
//! Records carry kind tags, never rendering concerns. Whatever consumes a
//! snapshot decides how a kind is presented.

use bcp_common::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of category display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Rendering-free tag describing a notification's nature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Urgent attention required.
    Alert,
    /// Routine, time-flexible work.
    Clock,
    /// Positive trend.
    TrendUp,
    /// Neutral metric movement.
    Chart,
    /// Negative or dismissive outcome.
    Dismiss,
    /// General announcement.
    Bell,
    /// Team or staffing update.
    Team,
    /// Correspondence.
    Mail,
    /// Revenue related.
    Revenue,
}

/// A single feed notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    /// Relative display time ("Just now", "12 minutes ago").
    pub time: String,
}

/// Scope for the top-performer leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformerScope {
    Category(Category),
    Overall,
}

impl PerformerScope {
    pub fn name(&self) -> &'static str {
        match self {
            PerformerScope::Category(category) => category.name(),
            PerformerScope::Overall => "overall",
        }
    }
}

impl fmt::Display for PerformerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerRecord {
    pub id: u64,
    pub name: String,
    pub department: String,
    pub score: u64,
    /// Formatted metric ("$412.3k", "87%", or a plain count).
    pub metric: String,
}
