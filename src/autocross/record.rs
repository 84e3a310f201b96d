//! Run records and leaderboard entries
//!
//! Field names match the JSON the course dashboards already read, so the
//! serde renames here are load-bearing.

use serde::{Deserialize, Serialize};

/// Hard cap on buffered samples per run: ten minutes at 40 samples/sec.
pub const RUN_BUFFER_CAPACITY: usize = 24_000;

/// Seconds added to a run's time per cone penalty when ranking.
pub const CONE_PENALTY_SECONDS: f32 = 2.0;

/// Maximum entries kept on a course leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// One buffered telemetry sample during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSample {
    /// Seconds since the run started
    pub timestamp: f64,
    pub brake: f32,
    pub throttle: f32,
    /// Lateral acceleration (left/right)
    pub lat_g: f32,
    /// Longitudinal acceleration (accel/brake)
    pub long_g: f32,
    pub speed: f32,
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    /// The game's own lap timer at this sample, seconds
    pub lap_timer: f32,
}

/// Column-oriented sample arrays as persisted in a run file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTelemetry {
    pub timestamps: Vec<f64>,
    pub brake: Vec<f32>,
    pub accel: Vec<f32>,
    pub accel_x: Vec<f32>,
    pub accel_y: Vec<f32>,
    pub speed: Vec<f32>,
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub pos_z: Vec<f32>,
}

/// Summary statistics computed in one pass over the buffer at finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub max_speed: f32,
    pub max_lat_g: f32,
    pub max_long_g: f32,
}

/// A finalized run, immutable once written. `cones` and `name` are edited
/// later by the course tooling, never by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: String,
    pub course_id: String,
    /// RFC 3339 wall-clock timestamp of the save
    pub timestamp: String,
    pub lap_time: f32,
    pub car_id: String,
    pub track_id: String,
    pub cones: u32,
    pub name: String,
    pub is_valid: bool,
    pub telemetry: RunTelemetry,
    pub statistics: RunStatistics,
}

impl RunRecord {
    /// Builds a record from a run buffer, computing the column arrays and
    /// summary statistics in a single pass.
    pub fn from_samples(
        run_id: String,
        course_id: String,
        timestamp: String,
        lap_time: f32,
        car_id: i32,
        track_id: i32,
        samples: &[RunSample],
    ) -> Self {
        let mut telemetry = RunTelemetry {
            timestamps: Vec::with_capacity(samples.len()),
            brake: Vec::with_capacity(samples.len()),
            accel: Vec::with_capacity(samples.len()),
            accel_x: Vec::with_capacity(samples.len()),
            accel_y: Vec::with_capacity(samples.len()),
            speed: Vec::with_capacity(samples.len()),
            pos_x: Vec::with_capacity(samples.len()),
            pos_y: Vec::with_capacity(samples.len()),
            pos_z: Vec::with_capacity(samples.len()),
        };
        let mut statistics = RunStatistics::default();

        for sample in samples {
            telemetry.timestamps.push(sample.timestamp);
            telemetry.brake.push(sample.brake);
            telemetry.accel.push(sample.throttle);
            telemetry.accel_x.push(sample.lat_g);
            telemetry.accel_y.push(sample.long_g);
            telemetry.speed.push(sample.speed);
            telemetry.pos_x.push(sample.pos_x);
            telemetry.pos_y.push(sample.pos_y);
            telemetry.pos_z.push(sample.pos_z);

            statistics.max_speed = statistics.max_speed.max(sample.speed);
            statistics.max_lat_g = statistics.max_lat_g.max(sample.lat_g.abs());
            statistics.max_long_g = statistics.max_long_g.max(sample.long_g.abs());
        }

        Self {
            run_id,
            course_id,
            timestamp,
            lap_time,
            car_id: car_id.to_string(),
            track_id: track_id.to_string(),
            cones: 0,
            name: String::new(),
            is_valid: true,
            telemetry,
            statistics,
        }
    }

    /// The leaderboard projection of this run.
    pub fn leaderboard_entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            run_id: self.run_id.clone(),
            lap_time: self.lap_time,
            cones: self.cones,
            adjusted_time: self.lap_time + self.cones as f32 * CONE_PENALTY_SECONDS,
            timestamp: self.timestamp.clone(),
            car_id: self.car_id.clone(),
        }
    }
}

/// One row of a course leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub run_id: String,
    pub lap_time: f32,
    pub cones: u32,
    pub adjusted_time: f32,
    pub timestamp: String,
    pub car_id: String,
}

/// Inserts an entry, re-sorts ascending by adjusted time and truncates to
/// the leaderboard bound.
pub fn leaderboard_insert(board: &mut Vec<LeaderboardEntry>, entry: LeaderboardEntry) {
    board.push(entry);
    board.sort_by(|a, b| {
        a.adjusted_time.partial_cmp(&b.adjusted_time).unwrap_or(std::cmp::Ordering::Equal)
    });
    board.truncate(LEADERBOARD_SIZE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(speed: f32, lat: f32, long: f32) -> RunSample {
        RunSample {
            timestamp: 0.0,
            brake: 0.0,
            throttle: 1.0,
            lat_g: lat,
            long_g: long,
            speed,
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 0.0,
            lap_timer: 0.0,
        }
    }

    fn entry(id: &str, lap_time: f32, cones: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            run_id: id.into(),
            lap_time,
            cones,
            adjusted_time: lap_time + cones as f32 * CONE_PENALTY_SECONDS,
            timestamp: "2026-01-01T00:00:00Z".into(),
            car_id: "1".into(),
        }
    }

    #[test]
    fn statistics_use_absolute_g() {
        let samples =
            vec![sample(30.0, -1.4, 0.2), sample(42.5, 0.9, -1.1), sample(10.0, 0.1, 0.3)];
        let record = RunRecord::from_samples(
            "run-1".into(),
            "course".into(),
            "2026-01-01T00:00:00Z".into(),
            61.2,
            3,
            7,
            &samples,
        );

        assert_eq!(record.statistics.max_speed, 42.5);
        assert_eq!(record.statistics.max_lat_g, 1.4);
        assert_eq!(record.statistics.max_long_g, 1.1);
        assert_eq!(record.telemetry.speed.len(), 3);
        assert!(record.is_valid);
        assert_eq!(record.cones, 0);
    }

    #[test]
    fn record_json_uses_dashboard_field_names() {
        let record = RunRecord::from_samples(
            "run-5".into(),
            "lot-b".into(),
            "2026-01-01T00:00:00Z".into(),
            45.0,
            2,
            9,
            &[sample(20.0, 0.5, 0.5)],
        );
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("runId").is_some());
        assert!(json.get("lapTime").is_some());
        assert!(json.get("isValid").is_some());
        assert!(json["telemetry"].get("accelX").is_some());
        assert!(json["telemetry"].get("posZ").is_some());
        assert!(json["statistics"].get("maxLatG").is_some());
    }

    #[test]
    fn leaderboard_sorts_by_adjusted_time() {
        let mut board = Vec::new();
        leaderboard_insert(&mut board, entry("slow", 50.0, 0));
        leaderboard_insert(&mut board, entry("fast-but-cones", 44.0, 4)); // adjusted 52
        leaderboard_insert(&mut board, entry("fast", 45.0, 0));

        let order: Vec<&str> = board.iter().map(|e| e.run_id.as_str()).collect();
        assert_eq!(order, vec!["fast", "slow", "fast-but-cones"]);
    }

    #[test]
    fn full_board_rejects_worse_run() {
        let mut board: Vec<LeaderboardEntry> =
            (0..LEADERBOARD_SIZE).map(|i| entry(&format!("run-{i}"), 40.0 + i as f32, 0)).collect();

        leaderboard_insert(&mut board, entry("worse", 99.0, 0));
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert!(board.iter().all(|e| e.run_id != "worse"));
    }

    #[test]
    fn full_board_admits_better_run_and_drops_last() {
        let mut board: Vec<LeaderboardEntry> =
            (0..LEADERBOARD_SIZE).map(|i| entry(&format!("run-{i}"), 40.0 + i as f32, 0)).collect();

        leaderboard_insert(&mut board, entry("better", 39.0, 0));
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board[0].run_id, "better");
        assert!(board.iter().all(|e| e.run_id != "run-9"));
    }
}
