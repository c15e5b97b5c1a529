//! Remote data sources for the BizCRM predictor.
//!
//! Display data, mock history, notifications, and leaderboards come from a
//! public demo JSON service. Every fetcher here is tolerant by contract:
//! transport failures, non-JSON bodies, and missing fields all degrade to
//! empty results or field defaults, never to an error the engine has to
//! handle. The [`DataSource`] trait is the seam the engine consumes, so
//! tests can substitute a deterministic in-memory source.

pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod records;
pub mod remote;
pub mod reshape;

pub use records::{
    ChartPoint, NotificationKind, NotificationRecord, PerformerRecord, PerformerScope,
};
pub use remote::RemoteSource;

use bcp_common::{Category, HistoryEntry, Prediction, Timeframe};

/// Provider of all remote display data.
///
/// Implementations must be cheap to share across threads; the engine calls
/// these from short-lived fetch workers.
pub trait DataSource: Send + Sync {
    /// Chart points for the category, scaled by the timeframe multiplier.
    fn chart_data(&self, category: Category, timeframe: Timeframe) -> Vec<ChartPoint>;

    /// Synthetic baseline history for the category, in display order
    /// (most recent label first).
    fn history_series(&self, category: Category) -> Vec<HistoryEntry>;

    /// Notification feed keyed to the current prediction.
    fn notifications(&self, category: Category, prediction: &Prediction)
        -> Vec<NotificationRecord>;

    /// Top three performers for the scope.
    fn top_performers(&self, scope: PerformerScope) -> Vec<PerformerRecord>;
}
