pub mod backfill;
pub mod refresher;
pub mod runner;

pub use backfill::{BackfillConfig, BackfillSummary, ReadableBackfill};
pub use refresher::FeedRefresher;
pub use runner::{RefreshScheduler, SchedulerConfig, SchedulerError, SchedulerState};
