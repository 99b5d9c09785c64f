//! sqlx-backed production event store.
//!
//! Queries use the runtime API rather than the compile-time macros so the
//! crate builds without a live database. Filter clauses are assembled with
//! `QueryBuilder`, which keeps every user-supplied value behind a bind
//! parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use super::errors::{Result, StoreError};
use super::models::{DateRange, InteractionSubject, OriginCondition, PurchaseEvent, SegmentFilter};
use super::EventStore;
use crate::types::abbrev_uuid;

const PURCHASE_COLUMNS: &str =
    "id, subject_id, bot_name, plan_name, plan_value, origin_condition, status, pix_generated_at, purchased_at";

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PurchaseRow {
    id: Uuid,
    subject_id: Uuid,
    bot_name: Option<String>,
    plan_name: Option<String>,
    plan_value: Decimal,
    origin_condition: String,
    status: String,
    pix_generated_at: DateTime<Utc>,
    purchased_at: Option<DateTime<Utc>>,
}

impl TryFrom<PurchaseRow> for PurchaseEvent {
    type Error = StoreError;

    fn try_from(row: PurchaseRow) -> Result<PurchaseEvent> {
        let origin_condition = row.origin_condition.parse().map_err(|message| StoreError::Decode {
            entity: "purchase_events",
            message: format!("row {}: {message}", abbrev_uuid(&row.id)),
        })?;
        let status = row.status.parse().map_err(|message| StoreError::Decode {
            entity: "purchase_events",
            message: format!("row {}: {message}", abbrev_uuid(&row.id)),
        })?;
        Ok(PurchaseEvent {
            id: row.id,
            subject_id: row.subject_id,
            bot_name: row.bot_name,
            plan_name: row.plan_name,
            plan_value: row.plan_value,
            origin_condition,
            status,
            pix_generated_at: row.pix_generated_at,
            purchased_at: row.purchased_at,
        })
    }
}

#[derive(FromRow)]
struct SubjectRow {
    id: Uuid,
    external_id: String,
    bot_name: Option<String>,
    last_interaction_at: Option<DateTime<Utc>>,
    has_purchased: bool,
}

impl From<SubjectRow> for InteractionSubject {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            bot_name: row.bot_name,
            last_interaction_at: row.last_interaction_at,
            has_purchased: row.has_purchased,
        }
    }
}

/// Append the WHERE clauses for `filter` to a builder that already holds a
/// `WHERE` on the feed timestamp range.
fn push_filter_clauses<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a SegmentFilter) {
    qb.push(" WHERE COALESCE(purchased_at, pix_generated_at) >= ");
    qb.push_bind(filter.range.start);
    qb.push(" AND COALESCE(purchased_at, pix_generated_at) <= ");
    qb.push_bind(filter.range.end);

    if let Some(status) = filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status.as_str());
    }
    if let Some(origin) = filter.origin_condition() {
        qb.push(" AND origin_condition = ");
        qb.push_bind(origin.as_str());
    }
    if let Some(bots) = &filter.bot_names
        && !bots.is_empty()
    {
        qb.push(" AND bot_name = ANY(");
        qb.push_bind(bots);
        qb.push(")");
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self), err)]
    async fn purchases_in_range(&self, range: &DateRange, origin: Option<OriginCondition>) -> Result<Vec<PurchaseEvent>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PURCHASE_COLUMNS} FROM purchase_events"));
        qb.push(" WHERE purchased_at >= ");
        qb.push_bind(range.start);
        qb.push(" AND purchased_at <= ");
        qb.push_bind(range.end);
        if let Some(origin) = origin {
            qb.push(" AND origin_condition = ");
            qb.push_bind(origin.as_str());
        }
        qb.push(" ORDER BY purchased_at, id");

        let rows: Vec<PurchaseRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(PurchaseEvent::try_from).collect()
    }

    #[instrument(skip(self), err)]
    async fn subjects_interacted_in(&self, range: &DateRange) -> Result<Vec<InteractionSubject>> {
        let rows: Vec<SubjectRow> = sqlx::query_as(
            "SELECT id, external_id, bot_name, last_interaction_at, has_purchased
             FROM interaction_subjects
             WHERE last_interaction_at >= $1 AND last_interaction_at <= $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(InteractionSubject::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count_purchases(&self, filter: &SegmentFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM purchase_events");
        push_filter_clauses(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    #[instrument(skip(self, filter), err)]
    async fn scan_purchases(&self, filter: &SegmentFilter, offset: i64, limit: i64) -> Result<Vec<PurchaseEvent>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PURCHASE_COLUMNS} FROM purchase_events"));
        push_filter_clauses(&mut qb, filter);
        qb.push(" ORDER BY COALESCE(purchased_at, pix_generated_at) DESC, id");
        qb.push(" OFFSET ");
        qb.push_bind(offset.max(0));
        qb.push(" LIMIT ");
        qb.push_bind(limit.max(0));

        let rows: Vec<PurchaseRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(PurchaseEvent::try_from).collect()
    }

    #[instrument(skip(self), err)]
    async fn distinct_bot_names(&self) -> Result<Vec<String>> {
        let rows: Vec<PgRow> = sqlx::query(
            "SELECT bot_name FROM interaction_subjects WHERE bot_name IS NOT NULL
             UNION
             SELECT bot_name FROM purchase_events WHERE bot_name IS NOT NULL
             ORDER BY bot_name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| row.try_get::<String, _>(0).map_err(StoreError::from)).collect()
    }
}
