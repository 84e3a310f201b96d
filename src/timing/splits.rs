//! Distance-quantized lap-split comparison
//!
//! A lap is cut into fixed 12-unit segments; the elapsed lap time at each
//! segment boundary forms the lap's split sequence. The live delta is the
//! current lap's split at the newest segment minus the baseline's split at
//! the same (clamped) index. Baselines come in three scopes: the vehicle's
//! own persisted best, the best any vehicle has set on the track, and the
//! best of the current session.
//!
//! Rewinds are the hard part. A mid-lap rewind truncates the sequence back
//! to the rewound segment and poisons index 0 with `-1.0`, which blocks the
//! lap from being adopted as a best at the line even if the game flags it
//! as one.

use std::str::FromStr;

use tracing::{debug, warn};

use super::VehicleContext;
use crate::store::SplitStore;

/// Distance units per split segment.
pub const SEGMENT_LENGTH: f32 = 12.0;

/// A lap boundary seen with the timer already past this is a missed zero
/// crossing (dropped frames) and invalidates the lap.
const MISSED_CROSSING_GUARD: f32 = 0.2;

/// The reported lap time must land within this of the last recorded split
/// for it to be appended as the final split (outlier guard).
const FINAL_SPLIT_TOLERANCE: f32 = 2.0;

/// Sentinel stored at index 0 once a rewind has invalidated the lap. Part
/// of the persisted file format.
const REWOUND: f32 = -1.0;

/// Which baseline the live delta is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// This vehicle's own persisted best lap
    Vehicle,
    /// The best lap any vehicle of the class has set on the track
    Class,
    /// The best lap of the current session, memory only
    Session,
}

impl SplitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Vehicle => "car",
            SplitMode::Class => "class",
            SplitMode::Session => "session",
        }
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(SplitMode::Vehicle),
            "class" => Ok(SplitMode::Class),
            "session" => Ok(SplitMode::Session),
            other => Err(format!("invalid split mode '{other}' (expected car, class or session)")),
        }
    }
}

/// The lap-split engine. One instance per ingest loop; all state explicit.
pub struct SplitTimer {
    mode: SplitMode,
    context: VehicleContext,
    current: Vec<f32>,
    personal_best: Vec<f32>,
    session_best: Vec<f32>,
    track_best: Vec<f32>,
    track_best_vehicle: i32,
    start_distance: f32,
    last_lap: i64,
    lap_valid: bool,
}

impl SplitTimer {
    pub fn new(mode: SplitMode) -> Self {
        Self {
            mode,
            context: VehicleContext::UNKNOWN,
            current: Vec::new(),
            personal_best: Vec::new(),
            session_best: Vec::new(),
            track_best: Vec::new(),
            track_best_vehicle: -1,
            start_distance: 0.0,
            last_lap: -1,
            lap_valid: false,
        }
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn context(&self) -> VehicleContext {
        self.context
    }

    /// The active baseline's final value, i.e. the best full lap time the
    /// delta is measured against. `None` when no baseline exists yet.
    pub fn best_lap(&self) -> Option<f32> {
        self.target().last().copied()
    }

    /// Advances the engine with one frame's worth of inputs and returns the
    /// live delta, or `None` when no baseline comparison is possible.
    ///
    /// `reference_best` is the source's own best-lap field; the source
    /// echoes the lap time there when the lap it just completed is a new
    /// best, which is what gates adoption.
    pub fn advance(
        &mut self,
        store: &SplitStore,
        context: VehicleContext,
        distance: f32,
        lap_counter: u16,
        current_lap_time: f32,
        last_lap_time: f32,
        reference_best: f32,
    ) -> Option<f32> {
        if context != self.context {
            self.context = context;
            self.reload_baselines(store);
        }

        let time = round2(current_lap_time);

        // Paused or menu telemetry reports a negative distance.
        if distance < 0.0 {
            self.last_lap = -1;
            self.lap_valid = false;
            return None;
        }

        let lap = i64::from(lap_counter);
        if lap > self.last_lap {
            self.last_lap = lap;
            self.lap_valid = true;

            if time > MISSED_CROSSING_GUARD {
                // Dropped frames hid the zero crossing; neither the stale
                // sequence nor this lap can be trusted.
                self.lap_valid = false;
                self.current.clear();
                return None;
            }

            if lap == 0 {
                // First lap of a session: cold start.
                self.session_best.clear();
                self.reload_baselines(store);
            }

            self.finish_lap(store, last_lap_time, reference_best);

            self.current.clear();
            self.start_distance = distance;
        }

        if !self.lap_valid {
            return None;
        }

        let traveled = distance - self.start_distance;
        let signed_index = (traveled / SEGMENT_LENGTH).floor() as i64 - 1;
        if signed_index < 0 {
            return None;
        }
        let index = signed_index as usize;

        if index + 1 < self.current.len() {
            // Within-lap rewind: drop everything past the rewound segment
            // and poison the lap against best adoption.
            self.current.truncate(index);
            self.current.push(time);
            self.current[0] = REWOUND;
        } else if index == self.current.len() {
            self.current.push(time);
        } else if index < self.current.len() {
            // Same segment as the previous sample.
        } else {
            warn!(
                index,
                recorded = self.current.len(),
                "split index jumped ahead, suppressing delta"
            );
            return None;
        }

        let target = self.target();
        if target.is_empty() {
            return None;
        }
        let clamped = index.min(target.len() - 1);
        Some(self.current[index] - target[clamped])
    }

    /// Completes the lap whose sequence is in `current`: appends the
    /// reported lap time as the final split and adopts the sequence into
    /// the baselines it improves.
    fn finish_lap(&mut self, store: &SplitStore, last_lap_time: f32, reference_best: f32) {
        if self.current.len() <= 1 {
            return;
        }

        // Outlier guard: the reported time has to land near the last
        // recorded split, otherwise frames went missing around the line.
        let last_recorded = self.current[self.current.len() - 1];
        if last_recorded + FINAL_SPLIT_TOLERANCE <= last_lap_time {
            return;
        }
        self.current.push(round3(last_lap_time));

        let rewound = self.current[0] == REWOUND;
        if rewound || last_lap_time <= 0.0 || last_lap_time != reference_best {
            return;
        }

        if self.personal_best.last().is_none_or(|&best| last_lap_time < best) {
            self.personal_best = self.current.clone();
            if self.context.has_track() {
                if let Err(err) = store.save_personal(self.context, &self.personal_best) {
                    warn!(error = %err, "failed to persist personal-best splits");
                }
            }

            // The track best is only reachable through a personal-best
            // improvement; its splits are the owning vehicle's own file.
            if self.track_best.last().is_none_or(|&best| last_lap_time < best) {
                self.track_best = self.current.clone();
                self.track_best_vehicle = self.context.vehicle_id;
                if self.context.has_track() {
                    if let Err(err) = store.save_track_best_owner(self.context) {
                        warn!(error = %err, "failed to persist track-best owner");
                    }
                }
            }
        }

        if self.session_best.last().is_none_or(|&best| last_lap_time < best) {
            self.session_best = self.current.clone();
        }
    }

    fn reload_baselines(&mut self, store: &SplitStore) {
        self.personal_best = store.load_personal(self.context).unwrap_or_else(|err| {
            debug!(error = %err, "no personal-best splits loaded");
            Vec::new()
        });
        match store.load_track_best(self.context) {
            Ok((vehicle, splits)) => {
                self.track_best_vehicle = vehicle;
                self.track_best = splits;
            }
            Err(err) => {
                debug!(error = %err, "no track-best splits loaded");
                self.track_best_vehicle = -1;
                self.track_best.clear();
            }
        }
    }

    fn target(&self) -> &[f32] {
        match self.mode {
            SplitMode::Vehicle => &self.personal_best,
            SplitMode::Class => &self.track_best,
            SplitMode::Session => &self.session_best,
        }
    }
}

fn round2(t: f32) -> f32 {
    (t * 100.0).round() / 100.0
}

fn round3(t: f32) -> f32 {
    (t * 1000.0).round() / 1000.0
}
