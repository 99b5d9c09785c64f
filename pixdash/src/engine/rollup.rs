//! Per-bot and per-plan breakdowns with revenue ranking.
//!
//! Grouping is explicit and in-memory over the slice the store returns -
//! there is no group-by pushed into the storage layer, so the ranking logic
//! is identical no matter which `EventStore` backs it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::errors::Result;
use crate::store::{DateRange, EventStore, PurchaseEvent};

/// Aggregated metrics for one bot over a range. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BotRollup {
    pub bot_name: String,
    #[schema(value_type = String)]
    pub revenue: Decimal,
    pub total_purchases: i64,
    pub total_users: i64,
    pub conversion_rate: f64,
    #[schema(value_type = String)]
    pub average_value: Decimal,
    /// Per-plan breakdown; purchases with no plan name are excluded, so the
    /// sales counts here may sum to less than `total_purchases`.
    pub plans: BTreeMap<String, PlanRollup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRollup {
    pub sales_count: i64,
    pub conversion_rate: f64,
}

pub struct BotRollupBuilder {
    store: Arc<dyn EventStore>,
}

impl BotRollupBuilder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// One rollup per bot with at least one purchase in `range`, ordered
    /// descending by revenue. Ties keep first-seen order - the upstream
    /// contract defines no secondary key, so stability is the only
    /// guaranteed tie-break.
    #[instrument(skip(self), err)]
    pub async fn build_rollups(&self, range: &DateRange) -> Result<Vec<BotRollup>> {
        let purchases = self.store.purchases_in_range(range, None).await?;
        let subjects = self.store.subjects_interacted_in(range).await?;

        // Group purchases by bot, preserving first-seen order
        let mut bot_order: Vec<String> = Vec::new();
        let mut by_bot: HashMap<String, Vec<&PurchaseEvent>> = HashMap::new();
        for purchase in &purchases {
            let Some(bot) = &purchase.bot_name else { continue };
            by_bot
                .entry(bot.clone())
                .or_insert_with(|| {
                    bot_order.push(bot.clone());
                    Vec::new()
                })
                .push(purchase);
        }

        // Distinct interacting users per bot over the same range
        let mut users_by_bot: HashMap<&str, i64> = HashMap::new();
        for subject in &subjects {
            if let Some(bot) = &subject.bot_name {
                *users_by_bot.entry(bot.as_str()).or_default() += 1;
            }
        }

        let mut rollups: Vec<BotRollup> = bot_order
            .into_iter()
            .map(|bot_name| {
                let bot_purchases = &by_bot[&bot_name];
                let total_purchases = bot_purchases.len() as i64;
                let revenue: Decimal = bot_purchases.iter().map(|p| p.plan_value).sum();
                let total_users = users_by_bot.get(bot_name.as_str()).copied().unwrap_or(0);

                let conversion_rate = if total_users > 0 {
                    total_purchases as f64 / total_users as f64 * 100.0
                } else {
                    0.0
                };
                let average_value = if total_purchases > 0 {
                    revenue / Decimal::from(total_purchases)
                } else {
                    Decimal::ZERO
                };

                let mut plans: BTreeMap<String, PlanRollup> = BTreeMap::new();
                for purchase in bot_purchases {
                    let Some(plan) = &purchase.plan_name else { continue };
                    plans
                        .entry(plan.clone())
                        .or_insert(PlanRollup {
                            sales_count: 0,
                            conversion_rate: 0.0,
                        })
                        .sales_count += 1;
                }
                for plan in plans.values_mut() {
                    plan.conversion_rate = if total_users > 0 {
                        plan.sales_count as f64 / total_users as f64 * 100.0
                    } else {
                        0.0
                    };
                }

                BotRollup {
                    bot_name,
                    revenue,
                    total_purchases,
                    total_users,
                    conversion_rate,
                    average_value,
                    plans,
                }
            })
            .collect();

        // Stable sort: equal revenues keep first-seen order
        rollups.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        Ok(rollups)
    }
}
