//! The aggregation engine.
//!
//! Every component here is a pure read path over the
//! [`EventStore`](crate::store::EventStore) trait:
//! nothing is cached between calls and nothing is written. Identical event
//! logs produce identical reports.
//!
//! - [`filter`]: raw query parameter resolution into a normalized
//!   [`SegmentFilter`](crate::store::SegmentFilter)
//! - [`stats`]: funnel snapshots for one `(range, segment)` pair
//! - [`rollup`]: per-bot and per-plan breakdowns with revenue ranking
//! - [`series`]: trailing daily revenue series
//! - [`feed`]: filtered, paginated transaction listing
//! - [`report`]: concurrent assembly of the full dashboard response

pub mod feed;
pub mod filter;
pub mod report;
pub mod rollup;
pub mod series;
pub mod stats;

pub use feed::{FeedPage, MovementRecord, TransactionFeed};
pub use filter::{ALL_BOTS, RawFilterParams, resolve};
pub use report::{DashboardReport, ReportingFacade};
pub use rollup::{BotRollup, BotRollupBuilder, PlanRollup};
pub use series::{SeriesPoint, TimeSeriesBuilder};
pub use stats::{StatsAggregator, StatsSnapshot};
