//! Run and leaderboard storage
//!
//! Layout under the data directory:
//!
//! ```text
//! autocross/<course>/runs/<run-id>.json   full RunRecord
//! autocross/<course>/top10.json           leaderboard, JSON array
//! autocross/armed.json                    armed flag + course id
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::autocross::{ArmedState, LeaderboardEntry, RunRecord};
use crate::error::Result;

/// Path-addressed storage for runs, leaderboards and the armed state.
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { root: data_dir.as_ref().join("autocross") }
    }

    fn leaderboard_path(&self, course_id: &str) -> PathBuf {
        self.root.join(course_id).join("top10.json")
    }

    fn armed_path(&self) -> PathBuf {
        self.root.join("armed.json")
    }

    /// Persists a finalized run under its course. Returns the written path.
    pub fn save_run(&self, run: &RunRecord) -> Result<PathBuf> {
        let path =
            self.root.join(&run.course_id).join("runs").join(format!("{}.json", run.run_id));
        super::write_json(&path, run)?;
        Ok(path)
    }

    /// Loads a course leaderboard; a missing file is an empty board.
    pub fn load_leaderboard(&self, course_id: &str) -> Result<Vec<LeaderboardEntry>> {
        let path = self.leaderboard_path(course_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        super::read_json(&path)
    }

    /// Persists a course leaderboard whole.
    pub fn save_leaderboard(&self, course_id: &str, board: &[LeaderboardEntry]) -> Result<()> {
        super::write_json(&self.leaderboard_path(course_id), &board)
    }

    /// Loads the persisted armed state. Missing or corrupt files mean
    /// "start disarmed", never an error.
    pub fn load_armed(&self) -> Option<ArmedState> {
        match super::read_json::<ArmedState>(&self.armed_path()) {
            Ok(state) => Some(state),
            Err(err) => {
                debug!(error = %err, "no armed state restored");
                None
            }
        }
    }

    /// Persists the armed state.
    pub fn save_armed(&self, is_armed: bool, course_id: &str) -> Result<()> {
        super::write_json(
            &self.armed_path(),
            &ArmedState { is_armed, course_id: course_id.to_string() },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocross::{RunSample, leaderboard_insert};

    fn record(course: &str, id: &str, lap_time: f32) -> RunRecord {
        let samples = [RunSample {
            timestamp: 0.1,
            brake: 0.0,
            throttle: 0.8,
            lat_g: 0.3,
            long_g: -0.4,
            speed: 22.0,
            pos_x: 1.0,
            pos_y: 2.0,
            pos_z: 3.0,
            lap_timer: 0.1,
        }];
        RunRecord::from_samples(
            id.into(),
            course.into(),
            "2026-01-01T00:00:00Z".into(),
            lap_time,
            4,
            12,
            &samples,
        )
    }

    #[test]
    fn run_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        let run = record("lot-a", "run-1000", 48.5);
        let path = store.save_run(&run).unwrap();
        assert!(path.ends_with("lot-a/runs/run-1000.json"));

        let loaded: RunRecord = crate::store::read_json(&path).unwrap();
        assert_eq!(loaded, run);
    }

    #[test]
    fn leaderboard_round_trip_and_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        assert!(store.load_leaderboard("nowhere").unwrap().is_empty());

        let mut board = Vec::new();
        leaderboard_insert(&mut board, record("lot-a", "run-1", 50.0).leaderboard_entry());
        leaderboard_insert(&mut board, record("lot-a", "run-2", 45.0).leaderboard_entry());
        store.save_leaderboard("lot-a", &board).unwrap();

        let loaded = store.load_leaderboard("lot-a").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].run_id, "run-2");
    }

    #[test]
    fn corrupt_armed_file_starts_disarmed() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path());

        store.save_armed(true, "lot-a").unwrap();
        assert!(store.load_armed().unwrap().is_armed);

        std::fs::write(dir.path().join("autocross").join("armed.json"), b"{not json").unwrap();
        assert!(store.load_armed().is_none());
    }
}
