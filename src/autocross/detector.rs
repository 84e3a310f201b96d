//! Run-detection state machine
//!
//! None of the supported games send an explicit start/stop for a timed
//! run, so runs are derived from the lap timer alone: a 0 → positive
//! transition starts one, a positive → 0 reset ends one, and a timer that
//! stops moving for two seconds (titles that never re-zero it) or a full
//! buffer (memory bound) forces the end. The detector stays armed after a
//! finalized run; only an external disarm returns it to idle.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::control::ControlHandle;
use super::record::{RUN_BUFFER_CAPACITY, RunRecord, RunSample, leaderboard_insert};
use crate::store::RunStore;

/// Lap timer unchanged for this long while positive ends the run.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Detector phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Armed,
    Recording,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Armed => "armed",
            RunPhase::Recording => "recording",
        }
    }
}

/// Per-frame input derived by the game loop.
#[derive(Debug, Clone, Copy)]
pub struct RunInput {
    /// The game's lap timer, seconds; exactly 0 between runs
    pub lap_timer: f32,
    /// The game's separately reported last-lap time, if the format has one
    pub last_lap: Option<f32>,
    pub vehicle_id: i32,
    pub track_id: i32,
    /// Sample to buffer while recording; `timestamp` is filled in here
    pub sample: RunSample,
}

/// The run-detection state machine.
pub struct RunDetector {
    phase: RunPhase,
    course_id: String,
    buffer: Vec<RunSample>,
    run_started: Instant,
    last_timer: f32,
    last_timer_change: Instant,
    vehicle_id: i32,
    track_id: i32,
}

impl RunDetector {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            course_id: String::new(),
            buffer: Vec::new(),
            run_started: Instant::now(),
            last_timer: -1.0,
            last_timer_change: Instant::now(),
            vehicle_id: -1,
            track_id: -1,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Feeds one decoded frame through the state machine.
    pub async fn process(&mut self, control: &ControlHandle, store: &RunStore, input: RunInput) {
        let state = control.snapshot().await;

        if !state.armed {
            if self.phase != RunPhase::Idle {
                if self.phase == RunPhase::Recording {
                    info!(samples = self.buffer.len(), "disarmed mid-run, buffer discarded");
                }
                self.buffer.clear();
                self.phase = RunPhase::Idle;
            }
            self.last_timer = input.lap_timer;
            return;
        }

        if self.phase == RunPhase::Idle {
            self.phase = RunPhase::Armed;
            self.course_id = state.course_id.clone();
            self.buffer.clear();
            self.last_timer = -1.0;
            info!(course = %self.course_id, "armed for run detection");
        } else if self.course_id != state.course_id {
            // Re-armed with a different course; any in-flight run is abandoned.
            self.phase = RunPhase::Armed;
            self.course_id = state.course_id.clone();
            self.buffer.clear();
            self.last_timer = -1.0;
            info!(course = %self.course_id, "re-armed for new course");
        }

        match self.phase {
            RunPhase::Armed => {
                if self.last_timer == 0.0 && input.lap_timer > 0.0 {
                    self.phase = RunPhase::Recording;
                    self.buffer.clear();
                    self.run_started = Instant::now();
                    self.last_timer_change = Instant::now();
                    self.vehicle_id = input.vehicle_id;
                    self.track_id = input.track_id;
                    info!(
                        course = %self.course_id,
                        vehicle = self.vehicle_id,
                        track = self.track_id,
                        "run started"
                    );
                    self.append(control, input).await;
                }
                self.last_timer = input.lap_timer;
            }
            RunPhase::Recording => {
                // The memory bound takes precedence over the timer detectors.
                if self.buffer.len() >= RUN_BUFFER_CAPACITY {
                    info!("run buffer full, forcing save");
                    self.finalize(control, store, input.last_lap).await;
                    self.last_timer = input.lap_timer;
                    return;
                }

                if input.lap_timer == 0.0 && self.last_timer > 0.0 {
                    info!("lap timer reset, run complete");
                    self.finalize(control, store, input.last_lap).await;
                    self.last_timer = 0.0;
                    return;
                }

                self.append(control, input).await;

                if input.lap_timer != self.last_timer {
                    self.last_timer = input.lap_timer;
                    self.last_timer_change = Instant::now();
                } else if self.last_timer > 0.0 && self.last_timer_change.elapsed() > STALL_TIMEOUT
                {
                    info!("lap timer stalled, run complete");
                    self.finalize(control, store, input.last_lap).await;
                }
            }
            RunPhase::Idle => {}
        }
    }

    async fn append(&mut self, control: &ControlHandle, input: RunInput) {
        let elapsed = self.run_started.elapsed().as_secs_f64();
        let mut sample = input.sample;
        sample.timestamp = elapsed;
        self.buffer.push(sample);
        control.update_elapsed(elapsed).await;
    }

    /// Persists the buffered run and returns to Armed. Persistence is best
    /// effort: a failed write is logged and the state machine advances.
    async fn finalize(&mut self, control: &ControlHandle, store: &RunStore, last_lap: Option<f32>) {
        if self.buffer.is_empty() {
            warn!("run ended with no samples buffered, nothing to save");
            self.phase = RunPhase::Armed;
            return;
        }

        let wall_elapsed = self.run_started.elapsed().as_secs_f32();
        let lap_time = last_lap
            .filter(|t| *t > 0.0)
            .or_else(|| self.buffer.last().map(|s| s.lap_timer).filter(|t| *t > 0.0))
            .unwrap_or(wall_elapsed);

        let saved_at = super::now_epoch_ms();
        let record = RunRecord::from_samples(
            format!("run-{saved_at}"),
            self.course_id.clone(),
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            lap_time,
            self.vehicle_id,
            self.track_id,
            &self.buffer,
        );

        match store.save_run(&record) {
            Ok(path) => info!(
                path = %path.display(),
                lap_time,
                samples = self.buffer.len(),
                "run saved"
            ),
            Err(err) => warn!(error = %err, "failed to save run"),
        }

        match store.load_leaderboard(&record.course_id) {
            Ok(mut board) => {
                leaderboard_insert(&mut board, record.leaderboard_entry());
                if let Err(err) = store.save_leaderboard(&record.course_id, &board) {
                    warn!(error = %err, "failed to save leaderboard");
                }
            }
            Err(err) => warn!(error = %err, "failed to load leaderboard"),
        }

        control.notify_run_saved().await;
        self.buffer.clear();
        self.phase = RunPhase::Armed;
    }
}

impl Default for RunDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lap_timer: f32) -> RunSample {
        RunSample {
            timestamp: 0.0,
            brake: 0.2,
            throttle: 0.8,
            lat_g: 0.5,
            long_g: -0.3,
            speed: 25.0,
            pos_x: 1.0,
            pos_y: 2.0,
            pos_z: 0.5,
            lap_timer,
        }
    }

    fn input(lap_timer: f32, last_lap: Option<f32>) -> RunInput {
        RunInput { lap_timer, last_lap, vehicle_id: 3, track_id: 11, sample: sample(lap_timer) }
    }

    async fn armed_setup(dir: &std::path::Path) -> (ControlHandle, RunStore) {
        let store = RunStore::new(dir);
        let control = ControlHandle::new();
        control.arm("lot-a".into(), &store).await;
        (control, store)
    }

    #[tokio::test]
    async fn timer_reset_finalizes_exactly_one_run() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        for timer in [0.0, 0.0, 1.2, 2.4, 3.6, 0.0] {
            detector.process(&control, &store, input(timer, None)).await;
        }

        assert_eq!(detector.phase(), RunPhase::Armed);
        let board = store.load_leaderboard("lot-a").unwrap();
        assert_eq!(board.len(), 1);
        // No last-lap field: the last buffered sample's timer wins.
        assert_eq!(board[0].lap_time, 3.6);
    }

    #[tokio::test]
    async fn reported_last_lap_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        for timer in [0.0, 1.2, 2.4, 3.6] {
            detector.process(&control, &store, input(timer, None)).await;
        }
        detector.process(&control, &store, input(0.0, Some(55.5))).await;

        let board = store.load_leaderboard("lot-a").unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].lap_time, 55.5);
    }

    #[tokio::test]
    async fn disarm_while_recording_discards_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        for timer in [0.0, 1.0, 2.0] {
            detector.process(&control, &store, input(timer, None)).await;
        }
        assert_eq!(detector.phase(), RunPhase::Recording);

        control.disarm(&store).await;
        detector.process(&control, &store, input(3.0, None)).await;

        assert_eq!(detector.phase(), RunPhase::Idle);
        assert!(store.load_leaderboard("lot-a").unwrap().is_empty());
        assert!(!dir.path().join("autocross").join("lot-a").join("runs").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_timer_finalizes_run() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        detector.process(&control, &store, input(0.0, None)).await;
        detector.process(&control, &store, input(1.2, None)).await;
        detector.process(&control, &store, input(1.8, None)).await;

        // Timer freezes at a positive value; run ends after the stall window.
        detector.process(&control, &store, input(1.8, None)).await;
        tokio::time::advance(Duration::from_millis(2100)).await;
        detector.process(&control, &store, input(1.8, None)).await;

        assert_eq!(detector.phase(), RunPhase::Armed);
        assert_eq!(store.load_leaderboard("lot-a").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn buffer_capacity_forces_save() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        detector.process(&control, &store, input(0.0, None)).await;
        let mut timer = 0.0f32;
        // First positive frame starts the run and buffers one sample; fill
        // the rest of the buffer exactly.
        for _ in 0..RUN_BUFFER_CAPACITY {
            timer += 0.025;
            detector.process(&control, &store, input(timer, None)).await;
        }
        assert_eq!(detector.phase(), RunPhase::Recording);
        assert!(store.load_leaderboard("lot-a").unwrap().is_empty());

        // One more frame trips the bound even though the timer keeps moving.
        timer += 0.025;
        detector.process(&control, &store, input(timer, None)).await;
        assert_eq!(detector.phase(), RunPhase::Armed);
        assert_eq!(store.load_leaderboard("lot-a").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detector_stays_armed_for_the_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        for timer in [0.0, 1.0, 2.0, 0.0, 0.0, 1.5, 3.0, 0.0] {
            detector.process(&control, &store, input(timer, None)).await;
        }

        assert_eq!(detector.phase(), RunPhase::Armed);
        assert_eq!(store.load_leaderboard("lot-a").unwrap().len(), 2);
        assert!(control.snapshot().await.armed);
    }

    #[tokio::test]
    async fn positive_timer_alone_does_not_start_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let (control, store) = armed_setup(dir.path()).await;
        let mut detector = RunDetector::new();

        // Armed mid-lap: the timer is already positive, no 0 seen yet.
        for timer in [42.0, 42.5, 43.0] {
            detector.process(&control, &store, input(timer, None)).await;
        }
        assert_eq!(detector.phase(), RunPhase::Armed);
    }
}
