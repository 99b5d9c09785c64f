//! Event store layer.
//!
//! The aggregation engine is storage-agnostic: every metric it produces is a
//! pure function of the slice of events selected by a `(DateRange,
//! SegmentFilter)` pair, read through the [`EventStore`] trait. The engine
//! issues no writes - charge creation/settlement and interaction recording
//! happen in external collaborators with their own isolation guarantees.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  API layer   │  (axum handlers)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │   Engine     │  (grouping, derived metrics, ranking)
//! └──────┬───────┘
//!        │ EventStore trait
//!        ↓
//! ┌──────────────┐   ┌──────────────┐
//! │ PgEventStore │   │ MemoryEvent- │
//! │  (postgres)  │   │ Store (tests,│
//! │              │   │  dev mode)   │
//! └──────────────┘   └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Event records and the normalized filter shapes
//! - [`postgres`]: sqlx-backed production store
//! - [`memory`]: in-process store for tests and the `store.type: memory` mode
//! - [`errors`]: store-specific error types
//!
//! The trait surface is deliberately small - range-filtered slices, a
//! sorted/paginated scan, counts, and a distinct-bot-name listing. Grouping
//! and aggregation live in the engine, not behind the store, so the logic is
//! independent of the storage technology.

pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use errors::{Result, StoreError};
pub use memory::MemoryEventStore;
pub use models::{
    DateRange, InteractionSubject, OriginCondition, PurchaseEvent, PurchaseStatus, PurchaseType, SegmentFilter,
};
pub use postgres::PgEventStore;

/// Read-only access to the interaction and purchase event log.
///
/// Implementations must tolerate concurrent reads without locking: one
/// dashboard request fans out several queries at once.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Purchase events with `purchased_at` inside `range`, optionally
    /// restricted to one origin condition. Order is unspecified but must be
    /// stable across calls with no intervening writes.
    async fn purchases_in_range(&self, range: &DateRange, origin: Option<OriginCondition>) -> Result<Vec<PurchaseEvent>>;

    /// Distinct subjects whose `last_interaction_at` falls inside `range`.
    async fn subjects_interacted_in(&self, range: &DateRange) -> Result<Vec<InteractionSubject>>;

    /// Count of purchase events matching `filter`, independent of pagination.
    async fn count_purchases(&self, filter: &SegmentFilter) -> Result<i64>;

    /// Sorted, paginated scan of purchase events matching `filter`,
    /// newest-first by `purchased_at` with `pix_generated_at` as the
    /// fallback for unsettled charges.
    async fn scan_purchases(&self, filter: &SegmentFilter, offset: i64, limit: i64) -> Result<Vec<PurchaseEvent>>;

    /// Distinct bot names seen on either subjects or purchases, for filter
    /// UIs. No aggregation logic.
    async fn distinct_bot_names(&self) -> Result<Vec<String>>;
}
