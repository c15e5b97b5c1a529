//! HTTP-backed [`DataSource`] over the demo JSON service.

use bcp_common::config::SourceConfig;
use bcp_common::{Category, HistoryEntry, Prediction, Timeframe};
use serde_json::Value;
use tracing::{debug, warn};

use crate::records::{ChartPoint, NotificationRecord, PerformerRecord, PerformerScope};
use crate::{http, reshape, DataSource};

/// Remote source speaking to a dummyjson-compatible endpoint.
///
/// Every accessor is tolerant: a transport or decode failure is logged and
/// surfaces as an empty result, matching the crate-wide contract.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    base_url: String,
    max_response_bytes: usize,
}

impl RemoteSource {
    pub fn new(base_url: &str, max_response_bytes: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_response_bytes,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(&config.base_url, config.max_response_bytes)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a JSON document, degrading to `None` on any failure.
    fn fetch(&self, path: &str) -> Option<Value> {
        let url = format!("{}{path}", self.base_url);
        match http::get_json(&url, self.max_response_bytes) {
            Ok(doc) => {
                debug!(%url, "source fetch ok");
                Some(doc)
            }
            Err(err) => {
                warn!(%url, error = %err, "source fetch failed, returning empty");
                None
            }
        }
    }

    fn chart_path(category: Category) -> &'static str {
        match category {
            Category::Ticket => "/comments?limit=10",
            Category::Sales => "/products?limit=4",
            Category::Enquiry => "/posts?limit=5",
        }
    }
}

impl DataSource for RemoteSource {
    fn chart_data(&self, category: Category, timeframe: Timeframe) -> Vec<ChartPoint> {
        let Some(doc) = self.fetch(Self::chart_path(category)) else {
            return Vec::new();
        };
        reshape::chart(category, timeframe, &doc, &mut rand::rng())
    }

    fn history_series(&self, _category: Category) -> Vec<HistoryEntry> {
        let Some(doc) = self.fetch("/todos?limit=10") else {
            return Vec::new();
        };
        reshape::history(&doc, &mut rand::rng())
    }

    fn notifications(
        &self,
        category: Category,
        prediction: &Prediction,
    ) -> Vec<NotificationRecord> {
        let Some(doc) = self.fetch("/users?limit=5") else {
            return Vec::new();
        };
        reshape::notifications(&doc, category, prediction, &mut rand::rng())
    }

    fn top_performers(&self, scope: PerformerScope) -> Vec<PerformerRecord> {
        let Some(doc) = self.fetch("/users?limit=10") else {
            return Vec::new();
        };
        reshape::performers(&doc, scope, &mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 127.0.0.1:9 (discard) refuses connections immediately, which keeps
    // these failure-path tests offline and fast.
    fn unreachable_source() -> RemoteSource {
        RemoteSource::new("http://127.0.0.1:9", 1_048_576)
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let source = RemoteSource::new("https://dummyjson.com/", 1024);
        assert_eq!(source.base_url(), "https://dummyjson.com");
    }

    #[test]
    fn failures_degrade_to_empty() {
        let source = unreachable_source();
        assert!(source.chart_data(Category::Ticket, Timeframe::Weekly).is_empty());
        assert!(source.history_series(Category::Sales).is_empty());
        let prediction = Prediction::from_value(0.7);
        assert!(source.notifications(Category::Enquiry, &prediction).is_empty());
        assert!(source.top_performers(PerformerScope::Overall).is_empty());
    }

    #[test]
    fn chart_paths_per_category() {
        assert_eq!(RemoteSource::chart_path(Category::Ticket), "/comments?limit=10");
        assert_eq!(RemoteSource::chart_path(Category::Sales), "/products?limit=4");
        assert_eq!(RemoteSource::chart_path(Category::Enquiry), "/posts?limit=5");
    }
}
