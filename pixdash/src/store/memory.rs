//! In-process event store.
//!
//! Backs the `store.type: memory` dev mode and the test suite. Events are
//! held in plain vectors behind an `RwLock`; every query clones the matching
//! slice, which keeps reads lock-free from the engine's point of view.

use std::collections::BTreeSet;
use std::sync::RwLock;

use async_trait::async_trait;

use super::errors::Result;
use super::models::{DateRange, InteractionSubject, OriginCondition, PurchaseEvent, SegmentFilter};
use super::EventStore;

#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    subjects: Vec<InteractionSubject>,
    purchases: Vec<PurchaseEvent>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed helper for tests and dev mode. Insertion order is preserved and
    /// is the stable order `purchases_in_range` reports.
    pub fn insert_subject(&self, subject: InteractionSubject) {
        self.inner.write().expect("store lock poisoned").subjects.push(subject);
    }

    pub fn insert_purchase(&self, purchase: PurchaseEvent) {
        self.inner.write().expect("store lock poisoned").purchases.push(purchase);
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn purchases_in_range(&self, range: &DateRange, origin: Option<OriginCondition>) -> Result<Vec<PurchaseEvent>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .purchases
            .iter()
            .filter(|p| p.purchased_at.is_some_and(|at| range.contains(at)))
            .filter(|p| origin.is_none_or(|o| p.origin_condition == o))
            .cloned()
            .collect())
    }

    async fn subjects_interacted_in(&self, range: &DateRange) -> Result<Vec<InteractionSubject>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .subjects
            .iter()
            .filter(|s| s.last_interaction_at.is_some_and(|at| range.contains(at)))
            .cloned()
            .collect())
    }

    async fn count_purchases(&self, filter: &SegmentFilter) -> Result<i64> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.purchases.iter().filter(|p| filter.matches(p)).count() as i64)
    }

    async fn scan_purchases(&self, filter: &SegmentFilter, offset: i64, limit: i64) -> Result<Vec<PurchaseEvent>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut matching: Vec<PurchaseEvent> = inner.purchases.iter().filter(|p| filter.matches(p)).cloned().collect();
        // Newest-first; sort_by is stable so equal timestamps keep store order
        matching.sort_by(|a, b| b.effective_at().cmp(&a.effective_at()));
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn distinct_bot_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let names: BTreeSet<String> = inner
            .subjects
            .iter()
            .filter_map(|s| s.bot_name.clone())
            .chain(inner.purchases.iter().filter_map(|p| p.bot_name.clone()))
            .collect();
        Ok(names.into_iter().collect())
    }
}
