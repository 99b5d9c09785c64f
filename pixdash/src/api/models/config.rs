//! Sanitized configuration metadata exposed to the frontend.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;

/// The subset of configuration a filter UI needs. Connection strings and
/// other secrets never appear here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// `memory` or `postgres`
    pub store_type: String,
    /// Trailing window length of the daily series
    pub series_days: u32,
    /// Feed page size when unspecified
    pub default_per_page: i64,
    /// Upper bound on the requested feed page size
    pub max_per_page: i64,
    /// Label used for purchases with no plan name
    pub plan_fallback_label: String,
    /// Declared bot names from the catalog
    pub declared_bots: Vec<String>,
    pub enable_metrics: bool,
}

impl From<&Config> for ConfigResponse {
    fn from(config: &Config) -> Self {
        let store_type = match config.store.postgres_url() {
            Some(_) => "postgres".to_string(),
            None => "memory".to_string(),
        };
        Self {
            store_type,
            series_days: config.dashboard.series_days,
            default_per_page: config.dashboard.default_per_page,
            max_per_page: config.dashboard.max_per_page,
            plan_fallback_label: config.dashboard.plan_fallback_label.clone(),
            declared_bots: config.bots.bots.iter().map(|b| b.name.clone()).collect(),
            enable_metrics: config.enable_metrics,
        }
    }
}
