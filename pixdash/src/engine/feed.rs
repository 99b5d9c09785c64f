//! Filtered, paginated, sorted view of raw purchase events with derived
//! display fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::errors::{Error, Result};
use crate::store::{EventStore, OriginCondition, PurchaseEvent, PurchaseStatus, SegmentFilter};
use crate::types::{PurchaseId, SubjectId};

/// One purchase event as the dashboard displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    #[schema(value_type = String, format = "uuid")]
    pub id: PurchaseId,
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    pub bot_name: Option<String>,
    /// `remarketing` for not-purchased-origin sales, `upsell` for
    /// purchased-origin sales, otherwise the raw plan name or the configured
    /// placeholder
    pub plan_label: String,
    #[schema(value_type = String)]
    pub plan_value: Decimal,
    pub status: PurchaseStatus,
    pub origin_condition: OriginCondition,
    /// Settlement time for paid purchases, charge-creation time otherwise
    pub display_timestamp: DateTime<Utc>,
    /// Seconds between charge creation and settlement; only present for paid
    /// purchases with both timestamps, never negative
    pub payment_delay: Option<i64>,
}

/// A single feed page plus the size of the full matching set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub records: Vec<MovementRecord>,
    /// Count of all matches, independent of slicing
    pub total_count: i64,
}

pub struct TransactionFeed {
    store: Arc<dyn EventStore>,
    plan_fallback_label: String,
}

impl TransactionFeed {
    pub fn new(store: Arc<dyn EventStore>, plan_fallback_label: impl Into<String>) -> Self {
        Self {
            store,
            plan_fallback_label: plan_fallback_label.into(),
        }
    }

    /// Newest-first page of purchases matching `filter`. `page` is
    /// one-based; a page past the last match is an empty slice, not an
    /// error.
    #[instrument(skip(self, filter), err)]
    pub async fn list_transactions(&self, filter: &SegmentFilter, page: i64, per_page: i64) -> Result<FeedPage> {
        if page < 1 {
            return Err(Error::InvalidPagination {
                field: "page",
                message: format!("page must be >= 1, got {page}"),
            });
        }
        if per_page < 1 {
            return Err(Error::InvalidPagination {
                field: "perPage",
                message: format!("perPage must be >= 1, got {per_page}"),
            });
        }

        let total_count = self.store.count_purchases(filter).await?;
        // An offset that does not fit in i64 is necessarily past the last match
        let Some(offset) = (page - 1).checked_mul(per_page) else {
            return Ok(FeedPage { records: Vec::new(), total_count });
        };
        let events = self.store.scan_purchases(filter, offset, per_page).await?;
        let records = events.into_iter().map(|event| self.to_record(event)).collect();

        Ok(FeedPage { records, total_count })
    }

    fn to_record(&self, event: PurchaseEvent) -> MovementRecord {
        let plan_label = match event.origin_condition {
            OriginCondition::NotPurchased => "remarketing".to_string(),
            OriginCondition::Purchased => "upsell".to_string(),
            _ => event.plan_name.clone().unwrap_or_else(|| self.plan_fallback_label.clone()),
        };

        let display_timestamp = match (event.status, event.purchased_at) {
            (PurchaseStatus::Paid, Some(settled_at)) => settled_at,
            _ => event.pix_generated_at,
        };

        let payment_delay = match (event.status, event.purchased_at) {
            (PurchaseStatus::Paid, Some(settled_at)) => {
                let delta = (settled_at - event.pix_generated_at).num_seconds();
                // Clock skew between the charge writer and the settlement
                // poller can produce a negative delta; report no delay at all
                (delta >= 0).then_some(delta)
            }
            _ => None,
        };

        MovementRecord {
            id: event.id,
            subject_id: event.subject_id,
            bot_name: event.bot_name,
            plan_label,
            plan_value: event.plan_value,
            status: event.status,
            origin_condition: event.origin_condition,
            display_timestamp,
            payment_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{DateRange, PurchaseType};
    use crate::store::MemoryEventStore;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn sale(plan: Option<&str>, status: PurchaseStatus, origin: OriginCondition, pix_at: &str, paid_at: Option<&str>) -> PurchaseEvent {
        PurchaseEvent {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            bot_name: Some("botA".to_string()),
            plan_name: plan.map(str::to_string),
            plan_value: Decimal::from(100),
            origin_condition: origin,
            status,
            pix_generated_at: pix_at.parse().unwrap(),
            purchased_at: paid_at.map(|s| s.parse().unwrap()),
        }
    }

    fn all_of_aug_20() -> SegmentFilter {
        SegmentFilter {
            range: DateRange::single_day("2026-08-20".parse().unwrap()),
            bot_names: None,
            status: None,
            purchase_type: PurchaseType::All,
        }
    }

    fn feed_with(events: Vec<PurchaseEvent>) -> TransactionFeed {
        let store = Arc::new(MemoryEventStore::new());
        for event in events {
            store.insert_purchase(event);
        }
        TransactionFeed::new(store, "Plano")
    }

    // perPage=1 over 3 matches: page 1 has one record, page 4 is an empty
    // slice, not an error.
    #[test_log::test(tokio::test)]
    async fn page_past_the_end_is_empty_not_an_error() {
        let feed = feed_with(vec![
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T09:00:00Z", Some("2026-08-20T09:05:00Z")),
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T10:00:00Z", Some("2026-08-20T10:05:00Z")),
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T11:00:00Z", Some("2026-08-20T11:05:00Z")),
        ]);

        let first = feed.list_transactions(&all_of_aug_20(), 1, 1).await.unwrap();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.total_count, 3);

        let past_end = feed.list_transactions(&all_of_aug_20(), 4, 1).await.unwrap();
        assert!(past_end.records.is_empty());
        assert_eq!(past_end.total_count, 3);
    }

    // A page number whose offset does not fit in i64 behaves like any other
    // page past the end.
    #[test_log::test(tokio::test)]
    async fn absurdly_large_page_is_past_the_end() {
        let feed = feed_with(vec![sale(
            Some("VIP"),
            PurchaseStatus::Paid,
            OriginCondition::None,
            "2026-08-20T09:00:00Z",
            Some("2026-08-20T09:05:00Z"),
        )]);

        let page = feed.list_transactions(&all_of_aug_20(), i64::MAX, 2).await.unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.total_count, 1);
    }

    #[test_log::test(tokio::test)]
    async fn non_positive_pagination_is_rejected() {
        let feed = feed_with(vec![]);
        assert!(matches!(
            feed.list_transactions(&all_of_aug_20(), 0, 10).await,
            Err(Error::InvalidPagination { field: "page", .. })
        ));
        assert!(matches!(
            feed.list_transactions(&all_of_aug_20(), 1, 0).await,
            Err(Error::InvalidPagination { field: "perPage", .. })
        ));
    }

    // Concatenating all pages yields every match exactly once.
    #[test_log::test(tokio::test)]
    async fn pages_concatenate_without_duplicates_or_gaps() {
        let events: Vec<PurchaseEvent> = (0..7)
            .map(|hour| {
                let pix_at = format!("2026-08-20T{:02}:00:00Z", 8 + hour);
                let paid_at = format!("2026-08-20T{:02}:05:00Z", 8 + hour);
                sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, &pix_at, Some(paid_at.as_str()))
            })
            .collect();
        let feed = feed_with(events);

        let mut seen = HashSet::new();
        let mut collected = 0;
        for page in 1..=4 {
            let result = feed.list_transactions(&all_of_aug_20(), page, 2).await.unwrap();
            assert_eq!(result.total_count, 7);
            for record in result.records {
                assert!(seen.insert(record.id), "duplicate record across pages");
                collected += 1;
            }
        }
        assert_eq!(collected, 7);
    }

    #[test_log::test(tokio::test)]
    async fn records_are_newest_first_with_pix_fallback() {
        let feed = feed_with(vec![
            // Settled early in the day
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T09:00:00Z", Some("2026-08-20T09:05:00Z")),
            // Unsettled, charge created late in the day - sorts by pix time
            sale(Some("VIP"), PurchaseStatus::Pending, OriginCondition::None, "2026-08-20T18:00:00Z", None),
        ]);

        let page = feed.list_transactions(&all_of_aug_20(), 1, 10).await.unwrap();
        assert_eq!(page.records[0].status, PurchaseStatus::Pending);
        assert_eq!(page.records[1].status, PurchaseStatus::Paid);
    }

    #[test_log::test(tokio::test)]
    async fn plan_label_reflects_the_origin_segment() {
        let feed = feed_with(vec![
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::NotPurchased, "2026-08-20T09:00:00Z", Some("2026-08-20T09:05:00Z")),
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::Purchased, "2026-08-20T10:00:00Z", Some("2026-08-20T10:05:00Z")),
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::Main, "2026-08-20T11:00:00Z", Some("2026-08-20T11:05:00Z")),
            sale(None, PurchaseStatus::Pending, OriginCondition::None, "2026-08-20T12:00:00Z", None),
        ]);

        let page = feed.list_transactions(&all_of_aug_20(), 1, 10).await.unwrap();
        let labels: Vec<&str> = page.records.iter().map(|r| r.plan_label.as_str()).collect();
        // Newest first: placeholder, raw plan, upsell, remarketing
        assert_eq!(labels, vec!["Plano", "VIP", "upsell", "remarketing"]);
    }

    #[test_log::test(tokio::test)]
    async fn payment_delay_only_for_settled_purchases() {
        let feed = feed_with(vec![
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T09:00:00Z", Some("2026-08-20T09:07:30Z")),
            sale(Some("VIP"), PurchaseStatus::Pending, OriginCondition::None, "2026-08-20T10:00:00Z", None),
        ]);

        let page = feed.list_transactions(&all_of_aug_20(), 1, 10).await.unwrap();
        let pending = &page.records[0];
        let paid = &page.records[1];
        assert_eq!(pending.payment_delay, None);
        assert_eq!(pending.display_timestamp, "2026-08-20T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(paid.payment_delay, Some(450));
        assert_eq!(paid.display_timestamp, "2026-08-20T09:07:30Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn payment_delay_is_never_negative() {
        let feed = feed_with(vec![sale(
            Some("VIP"),
            PurchaseStatus::Paid,
            OriginCondition::None,
            "2026-08-20T10:00:00Z",
            // Settlement recorded before the charge - skewed writer clocks
            Some("2026-08-20T09:59:00Z"),
        )]);

        let page = feed.list_transactions(&all_of_aug_20(), 1, 10).await.unwrap();
        assert_eq!(page.records[0].payment_delay, None);
    }

    #[test_log::test(tokio::test)]
    async fn status_filter_narrows_the_feed() {
        let feed = feed_with(vec![
            sale(Some("VIP"), PurchaseStatus::Paid, OriginCondition::None, "2026-08-20T09:00:00Z", Some("2026-08-20T09:05:00Z")),
            sale(Some("VIP"), PurchaseStatus::Cancelled, OriginCondition::None, "2026-08-20T10:00:00Z", Some("2026-08-20T10:00:00Z")),
        ]);

        let mut filter = all_of_aug_20();
        filter.status = Some(PurchaseStatus::Cancelled);
        let page = feed.list_transactions(&filter, 1, 10).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.records[0].status, PurchaseStatus::Cancelled);
    }
}
