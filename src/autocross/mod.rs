//! Run detection and recording
//!
//! Used for games whose lap counter has no useful segment semantics: a run
//! is detected purely from the lap timer's transition pattern, buffered
//! sample by sample, and finalized into a persisted record plus a bounded
//! per-course leaderboard. Arming and disarming come from the HTTP control
//! surface through the shared [`ControlHandle`].

mod control;
mod detector;
mod record;

pub use control::{ArmedState, ControlHandle, RecordingControl};
pub use detector::{RunDetector, RunInput, RunPhase};
pub use record::{
    CONE_PENALTY_SECONDS, LEADERBOARD_SIZE, LeaderboardEntry, RUN_BUFFER_CAPACITY, RunRecord,
    RunSample, RunStatistics, RunTelemetry, leaderboard_insert,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch; run ids and saved-at stamps use this.
pub(crate) fn now_epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
