//! Shared data shapes for interaction and purchase events.
//!
//! These are the records the engine reads from the event store, plus the
//! normalized filter types every query is expressed against. Nothing here is
//! ever written back by this service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::types::{PurchaseId, SubjectId};

/// A user/lead tracked by the bot runtime. Mutated whenever a new interaction
/// or purchase is recorded; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSubject {
    pub id: SubjectId,
    /// Messaging-platform identifier (e.g. a Telegram user id)
    pub external_id: String,
    pub bot_name: Option<String>,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub has_purchased: bool,
}

/// A charge issued through the payment gateway. Created as `pending` when the
/// Pix charge is generated and flipped to `paid`/`cancelado` by the gateway
/// poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub id: PurchaseId,
    pub subject_id: SubjectId,
    pub bot_name: Option<String>,
    pub plan_name: Option<String>,
    /// Charge value in currency units
    pub plan_value: Decimal,
    pub origin_condition: OriginCondition,
    pub status: PurchaseStatus,
    /// When the Pix charge was created
    pub pix_generated_at: DateTime<Utc>,
    /// Semantically "settled at" only when `status` is `paid`; the writer
    /// defaults it to the creation time otherwise.
    pub purchased_at: Option<DateTime<Utc>>,
}

impl PurchaseEvent {
    /// Timestamp used for feed ordering and range matching: `purchased_at`
    /// with `pix_generated_at` as the fallback for unsettled charges.
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.purchased_at.unwrap_or(self.pix_generated_at)
    }
}

/// Acquisition path of a purchase. `not_purchased`/`purchased` mark sales
/// originating from remarketing sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OriginCondition {
    None,
    Main,
    NotPurchased,
    Purchased,
}

impl OriginCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginCondition::None => "none",
            OriginCondition::Main => "main",
            OriginCondition::NotPurchased => "not_purchased",
            OriginCondition::Purchased => "purchased",
        }
    }
}

impl fmt::Display for OriginCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OriginCondition::None),
            "main" => Ok(OriginCondition::Main),
            "not_purchased" => Ok(OriginCondition::NotPurchased),
            "purchased" => Ok(OriginCondition::Purchased),
            other => Err(format!("unknown origin condition '{other}'")),
        }
    }
}

/// Settlement state of a purchase. The cancelled state is spelled `cancelado`
/// on the wire and in storage - that is what the payment gateway writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PurchaseStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Paid => "paid",
            PurchaseStatus::Cancelled => "cancelado",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "paid" => Ok(PurchaseStatus::Paid),
            "cancelado" => Ok(PurchaseStatus::Cancelled),
            other => Err(format!("unknown purchase status '{other}'")),
        }
    }
}

/// Origin-segment restriction requested by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    All,
    Main,
    NotPurchased,
    Purchased,
}

impl PurchaseType {
    /// Maps the feed's purchase-type restriction to an origin condition.
    /// `all` means no restriction.
    pub fn origin_condition(&self) -> Option<OriginCondition> {
        match self {
            PurchaseType::All => None,
            PurchaseType::Main => Some(OriginCondition::Main),
            PurchaseType::NotPurchased => Some(OriginCondition::NotPurchased),
            PurchaseType::Purchased => Some(OriginCondition::Purchased),
        }
    }
}

impl FromStr for PurchaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PurchaseType::All),
            "main" => Ok(PurchaseType::Main),
            "not_purchased" => Ok(PurchaseType::NotPurchased),
            "purchased" => Ok(PurchaseType::Purchased),
            other => Err(format!("unknown purchase type '{other}'")),
        }
    }
}

/// Inclusive timestamp range covering whole calendar days
/// (00:00:00.000 through 23:59:59.999).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Range spanning `start_day` through `end_day`, both inclusive.
    /// Callers must ensure `start_day <= end_day`.
    pub fn days(start_day: NaiveDate, end_day: NaiveDate) -> Self {
        Self {
            start: day_floor(start_day),
            end: day_ceil(end_day),
        }
    }

    /// Range covering exactly one calendar day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self::days(day, day)
    }

    /// Trailing window of `num_days` days ending at `today`, inclusive.
    pub fn trailing_days(today: NaiveDate, num_days: u32) -> Self {
        let span = i64::from(num_days.max(1)) - 1;
        Self::days(today - chrono::Duration::days(span), today)
    }

    /// Effectively unbounded range used for all-time totals. The bounds stay
    /// well inside what a Postgres timestamptz can encode.
    pub fn all_time() -> Self {
        Self::days(
            NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date"),
            NaiveDate::from_ymd_opt(9999, 12, 31).expect("valid date"),
        )
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

fn day_floor(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(0, 0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

fn day_ceil(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is always a valid time")
        .and_utc()
}

/// Normalized predicate over purchase events, resolved from the dashboard's
/// raw query parameters by [`crate::engine::filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFilter {
    pub range: DateRange,
    /// `None`/empty means no bot restriction
    pub bot_names: Option<Vec<String>>,
    pub status: Option<PurchaseStatus>,
    pub purchase_type: PurchaseType,
}

impl SegmentFilter {
    /// Origin-condition restriction implied by the purchase-type filter.
    pub fn origin_condition(&self) -> Option<OriginCondition> {
        self.purchase_type.origin_condition()
    }

    /// Whether `purchase` satisfies every clause of this filter. Range
    /// matching uses the effective timestamp, the same field the feed sorts
    /// by, so a page never shows rows its own range excluded.
    pub fn matches(&self, purchase: &PurchaseEvent) -> bool {
        if !self.range.contains(purchase.effective_at()) {
            return false;
        }
        if let Some(status) = self.status
            && purchase.status != status
        {
            return false;
        }
        if let Some(origin) = self.origin_condition()
            && purchase.origin_condition != origin
        {
            return false;
        }
        if let Some(bots) = &self.bot_names
            && !bots.is_empty()
        {
            match &purchase.bot_name {
                Some(bot) if bots.iter().any(|b| b == bot) => {}
                _ => return false,
            }
        }
        true
    }
}
