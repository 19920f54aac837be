//! Capture core: listing domain types and the pure per-run state machine.
mod effect;
mod msg;
mod record;
mod state;
mod summary;
mod types;
mod update;

pub use effect::Effect;
pub use msg::Msg;
pub use record::{canonical_work_url, dedupe_by_url, WorkRecord, EXPORT_COLUMNS, ARCHIVE_ORIGIN, WORK_URL_QUERY};
pub use state::{RunOptions, RunPhase, RunState};
pub use summary::{RunSummary, YearOutcome};
pub use types::{PageKey, PageSource, YearConfig, YearStop};
pub use update::update;
