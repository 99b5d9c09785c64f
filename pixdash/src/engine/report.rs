//! Assembles the full dashboard response from the other engine components.
//!
//! Pure orchestration. Every sub-computation is issued concurrently against
//! the store and joined; nothing here filters, groups, or sums on its own.
//! The five range-bound snapshots are pinned to today/yesterday while the
//! rollups and the feed follow the caller's resolved filter, so the header
//! cards stay comparable day over day no matter what the tables below them
//! are filtered to.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::config::DashboardConfig;
use crate::engine::feed::{FeedPage, MovementRecord, TransactionFeed};
use crate::engine::rollup::{BotRollup, BotRollupBuilder};
use crate::engine::series::{SeriesPoint, TimeSeriesBuilder};
use crate::engine::stats::{StatsAggregator, StatsSnapshot};
use crate::errors::{Error, Result};
use crate::store::{DateRange, EventStore, OriginCondition, SegmentFilter};

/// Everything one dashboard render needs, assembled in a single call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// Whole-segment snapshot over today
    pub stats_all: StatsSnapshot,
    /// Whole-segment snapshot over yesterday
    pub stats_yesterday: StatsSnapshot,
    /// Main-origin snapshot over today
    pub stats_main: StatsSnapshot,
    /// Remarketing-origin snapshot over today
    pub stats_not_purchased: StatsSnapshot,
    /// Upsell-origin snapshot over today
    pub stats_purchased: StatsSnapshot,
    /// All-time whole-segment snapshot
    pub stats_total: StatsSnapshot,
    /// Daily revenue series over the trailing window, oldest first
    #[serde(rename = "stats7Days")]
    pub stats_7_days: Vec<SeriesPoint>,
    /// Bot names in ranking order, matching `bot_details`
    pub bot_ranking: Vec<String>,
    /// Per-bot rollups over the filtered range, descending by revenue
    pub bot_details: Vec<BotRollup>,
    /// Requested feed page over the filtered segment, newest first
    pub last_movements: Vec<MovementRecord>,
    /// Count of all feed matches, independent of slicing
    pub total_movements: i64,
}

pub struct ReportingFacade {
    stats: StatsAggregator,
    rollups: BotRollupBuilder,
    series: TimeSeriesBuilder,
    feed: TransactionFeed,
    series_days: u32,
    deadline: Option<Duration>,
}

impl ReportingFacade {
    pub fn new(store: Arc<dyn EventStore>, dashboard: &DashboardConfig) -> Self {
        Self {
            stats: StatsAggregator::new(store.clone()),
            rollups: BotRollupBuilder::new(store.clone()),
            series: TimeSeriesBuilder::new(store.clone()),
            feed: TransactionFeed::new(store, dashboard.plan_fallback_label.clone()),
            series_days: dashboard.series_days,
            deadline: dashboard.report_deadline,
        }
    }

    /// One full dashboard report. When a deadline is configured and elapses
    /// before every sub-query finishes, the in-flight queries are dropped
    /// and the whole call fails - a report is never partially merged.
    #[instrument(skip(self, filter), err)]
    pub async fn build_report(&self, filter: &SegmentFilter, page: i64, per_page: i64, today: NaiveDate) -> Result<DashboardReport> {
        let assemble = self.assemble(filter, page, per_page, today);
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, assemble).await.map_err(|_| Error::PartialResult)?,
            None => assemble.await,
        }
    }

    async fn assemble(&self, filter: &SegmentFilter, page: i64, per_page: i64, today: NaiveDate) -> Result<DashboardReport> {
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| anyhow::anyhow!("no calendar day precedes {today}"))?;
        let today_range = DateRange::single_day(today);
        let yesterday_range = DateRange::single_day(yesterday);
        let all_time = DateRange::all_time();

        let (stats_all, stats_yesterday, stats_main, stats_not_purchased, stats_purchased, stats_total, stats_7_days, bot_details, feed_page) =
            tokio::try_join!(
                self.stats.compute_snapshot(&today_range, None),
                self.stats.compute_snapshot(&yesterday_range, None),
                self.stats.compute_snapshot(&today_range, Some(OriginCondition::Main)),
                self.stats.compute_snapshot(&today_range, Some(OriginCondition::NotPurchased)),
                self.stats.compute_snapshot(&today_range, Some(OriginCondition::Purchased)),
                self.stats.compute_snapshot(&all_time, None),
                self.series.build_daily_series(today, self.series_days),
                self.rollups.build_rollups(&filter.range),
                self.feed.list_transactions(filter, page, per_page),
            )?;

        let bot_ranking = bot_details.iter().map(|b| b.bot_name.clone()).collect();
        let FeedPage { records: last_movements, total_count: total_movements } = feed_page;

        Ok(DashboardReport {
            stats_all,
            stats_yesterday,
            stats_main,
            stats_not_purchased,
            stats_purchased,
            stats_total,
            stats_7_days,
            bot_ranking,
            bot_details,
            last_movements,
            total_movements,
        })
    }
}
