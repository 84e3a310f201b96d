//! Shared recording control state
//!
//! One lock-guarded record with two writers: the HTTP control surface arms
//! and disarms, the run detector publishes elapsed/run-active/saved-at.
//! The lock is held only across the read or write of the record itself.
//!
//! The wire field `isRecording` predates the tri-state detector and means
//! "armed"; the dashboards poll it, so the name stays.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::store::RunStore;

/// Snapshot of the recording control record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingControl {
    /// Armed flag: ready to detect and record the next run
    #[serde(rename = "isRecording")]
    pub armed: bool,
    pub course_id: String,
    /// Seconds since the active run started, 0 when no run is active
    pub elapsed: f64,
    pub run_active: bool,
    /// Epoch milliseconds of the last auto-saved run, 0 if none
    pub run_saved_at: u64,
}

/// The armed subset persisted across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmedState {
    pub is_armed: bool,
    pub course_id: String,
}

/// Cloneable handle to the lock-guarded control record.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    inner: Arc<Mutex<RecordingControl>>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted armed state at startup, if any.
    pub async fn restore(&self, store: &RunStore) {
        if let Some(armed) = store.load_armed() {
            if armed.is_armed && !armed.course_id.is_empty() {
                let mut control = self.inner.lock().await;
                control.armed = true;
                control.course_id = armed.course_id.clone();
                info!(course = %armed.course_id, "restored armed state");
            }
        }
    }

    /// Current state, by value.
    pub async fn snapshot(&self) -> RecordingControl {
        self.inner.lock().await.clone()
    }

    /// Arms (or re-arms with a new course). External control surface only.
    pub async fn arm(&self, course_id: String, store: &RunStore) {
        {
            let mut control = self.inner.lock().await;
            control.armed = true;
            control.course_id = course_id.clone();
            control.elapsed = 0.0;
        }
        if let Err(err) = store.save_armed(true, &course_id) {
            warn!(error = %err, "failed to persist armed state");
        }
        info!(course = %course_id, "recording armed");
    }

    /// Disarms unconditionally. External control surface only.
    pub async fn disarm(&self, store: &RunStore) {
        {
            let mut control = self.inner.lock().await;
            control.armed = false;
            control.run_active = false;
            control.elapsed = 0.0;
        }
        if let Err(err) = store.save_armed(false, "") {
            warn!(error = %err, "failed to persist armed state");
        }
        info!("recording disarmed");
    }

    /// Publishes run progress. Detector only.
    pub async fn update_elapsed(&self, elapsed: f64) {
        let mut control = self.inner.lock().await;
        control.elapsed = elapsed;
        control.run_active = true;
    }

    /// Signals that a run was finalized and saved. Detector only; the
    /// detector stays armed so the arm flag is untouched.
    pub async fn notify_run_saved(&self) {
        let mut control = self.inner.lock().await;
        control.run_saved_at = super::now_epoch_ms();
        control.run_active = false;
        control.elapsed = 0.0;
    }
}
