//! Day-by-day revenue series over a trailing window.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::errors::Result;
use crate::store::{DateRange, EventStore};

use super::stats::StatsAggregator;

/// One calendar day of the revenue series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub revenue_generated: Decimal,
    #[schema(value_type = String)]
    pub revenue_converted: Decimal,
}

pub struct TimeSeriesBuilder {
    store: Arc<dyn EventStore>,
}

impl TimeSeriesBuilder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// One point per calendar day for the trailing `num_days` window ending
    /// at `today`, oldest first. Each point is a single-day snapshot with no
    /// origin filter, recomputed fresh on every call - no incremental state
    /// is carried between calls. Day queries are issued concurrently.
    #[instrument(skip(self), err)]
    pub async fn build_daily_series(&self, today: NaiveDate, num_days: u32) -> Result<Vec<SeriesPoint>> {
        let aggregator = StatsAggregator::new(self.store.clone());
        let window = DateRange::trailing_days(today, num_days);
        let first_day = window.start.date_naive();

        let days: Vec<NaiveDate> = (0..num_days.max(1))
            .map(|offset| first_day + chrono::Duration::days(i64::from(offset)))
            .collect();

        let ranges: Vec<DateRange> = days.iter().map(|day| DateRange::single_day(*day)).collect();
        let snapshots = try_join_all(ranges.iter().map(|range| aggregator.compute_snapshot(range, None))).await?;

        Ok(days
            .into_iter()
            .zip(snapshots)
            .map(|(date, snapshot)| SeriesPoint {
                date,
                revenue_generated: snapshot.total_revenue_generated,
                revenue_converted: snapshot.total_revenue_converted,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{OriginCondition, PurchaseEvent, PurchaseStatus};
    use crate::store::MemoryEventStore;
    use uuid::Uuid;

    fn seed_sale(store: &MemoryEventStore, value: i64, at: &str) {
        store.insert_purchase(PurchaseEvent {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            bot_name: Some("botA".to_string()),
            plan_name: Some("VIP".to_string()),
            plan_value: Decimal::from(value),
            origin_condition: OriginCondition::None,
            status: PurchaseStatus::Paid,
            pix_generated_at: at.parse().unwrap(),
            purchased_at: Some(at.parse().unwrap()),
        });
    }

    #[test_log::test(tokio::test)]
    async fn seven_points_oldest_first() {
        let store = Arc::new(MemoryEventStore::new());
        seed_sale(&store, 100, "2026-08-20T12:00:00Z");
        seed_sale(&store, 40, "2026-08-14T12:00:00Z");
        // Outside the window
        seed_sale(&store, 999, "2026-08-13T12:00:00Z");

        let today: NaiveDate = "2026-08-20".parse().unwrap();
        let series = TimeSeriesBuilder::new(store).build_daily_series(today, 7).await.unwrap();

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().date, "2026-08-14".parse::<NaiveDate>().unwrap());
        assert_eq!(series.last().unwrap().date, today);
        assert_eq!(series[0].revenue_generated, Decimal::from(40));
        assert_eq!(series[6].revenue_generated, Decimal::from(100));
        assert!(series[1..6].iter().all(|p| p.revenue_generated == Decimal::ZERO));
    }

    #[test_log::test(tokio::test)]
    async fn each_point_matches_a_single_day_snapshot() {
        let store = Arc::new(MemoryEventStore::new());
        seed_sale(&store, 70, "2026-08-19T12:00:00Z");

        let today: NaiveDate = "2026-08-20".parse().unwrap();
        let series = TimeSeriesBuilder::new(store.clone()).build_daily_series(today, 2).await.unwrap();

        let aggregator = StatsAggregator::new(store);
        let day: NaiveDate = "2026-08-19".parse().unwrap();
        let snapshot = aggregator
            .compute_snapshot(&DateRange::single_day(day), None)
            .await
            .unwrap();
        assert_eq!(series[0].revenue_generated, snapshot.total_revenue_generated);
        assert_eq!(series[0].revenue_converted, snapshot.total_revenue_converted);
    }

    #[test_log::test(tokio::test)]
    async fn series_is_restartable_with_identical_results() {
        let store = Arc::new(MemoryEventStore::new());
        seed_sale(&store, 100, "2026-08-20T12:00:00Z");

        let builder = TimeSeriesBuilder::new(store);
        let today: NaiveDate = "2026-08-20".parse().unwrap();
        let first = builder.build_daily_series(today, 7).await.unwrap();
        let second = builder.build_daily_series(today, 7).await.unwrap();
        assert_eq!(first, second);
    }
}
