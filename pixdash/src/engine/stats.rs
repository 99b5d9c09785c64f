//! Funnel snapshot computation for one `(range, segment)` pair.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::errors::Result;
use crate::store::{DateRange, EventStore, OriginCondition};
use crate::types::SubjectId;

/// Derived funnel metrics for one `(range, segment)` pair. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_leads: i64,
    pub total_purchases: i64,
    /// Percentage; 0 whenever `total_leads` is 0
    pub conversion_rate: f64,
    #[schema(value_type = String)]
    pub total_revenue_generated: Decimal,
    /// Currently defined identically to `total_revenue_generated`, so
    /// pending and cancelled charges are counted as converted revenue.
    /// Intentional replication of upstream behavior until product intent is
    /// clarified; see DESIGN.md.
    #[schema(value_type = String)]
    pub total_revenue_converted: Decimal,
}

pub struct StatsAggregator {
    store: Arc<dyn EventStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Pure read; no side effects. Store failures propagate unchanged.
    ///
    /// With an origin condition, the lead count is the intersection of
    /// "owns a selected purchase" and "interacted inside the range" - a
    /// subject who purchased under the condition but interacted on a
    /// different day is excluded. Replicated faithfully from the upstream
    /// definition; see DESIGN.md before "fixing" this.
    #[instrument(skip(self), err)]
    pub async fn compute_snapshot(&self, range: &DateRange, origin: Option<OriginCondition>) -> Result<StatsSnapshot> {
        let purchases = self.store.purchases_in_range(range, origin).await?;

        let total_purchases = purchases.len() as i64;
        let total_revenue_generated: Decimal = purchases.iter().map(|p| p.plan_value).sum();

        let subjects = self.store.subjects_interacted_in(range).await?;
        let total_leads = match origin {
            None => subjects.len() as i64,
            Some(_) => {
                let buyers: HashSet<SubjectId> = purchases.iter().map(|p| p.subject_id).collect();
                subjects.iter().filter(|s| buyers.contains(&s.id)).count() as i64
            }
        };

        let conversion_rate = if total_leads > 0 {
            total_purchases as f64 / total_leads as f64 * 100.0
        } else {
            0.0
        };

        Ok(StatsSnapshot {
            total_leads,
            total_purchases,
            conversion_rate,
            total_revenue_generated,
            total_revenue_converted: total_revenue_generated,
        })
    }
}
