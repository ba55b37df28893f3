//! Metrics sync engine: staleness decisions, per-configuration sessions and the audit trail.

mod activity;
mod date_range;
mod engine;
mod session;
mod types;

pub use activity::{ActivityRecorder, batch_status, google_ads_activity};
pub use date_range::DateRange;
pub use engine::{MetricsSyncEngine, is_stale};
pub use session::SyncSession;
pub use types::{
    BatchOutcome, DEFAULT_HISTORICAL_YEARS, ManualSyncRequest, ManualSyncSummary, SyncOptions,
    SyncResult,
};
