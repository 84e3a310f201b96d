//! Per-vehicle cumulative distance
//!
//! The games report a per-race `DistanceTraveled` that resets, pauses and
//! rewinds; the odometer turns that into a lifetime total per vehicle that
//! only ever grows. Pending travel is banked into the persisted total on
//! the edges where the in-race reading becomes untrustworthy: vehicle
//! change, staging exit, rewind, leaving race state.

use tracing::{debug, warn};

use crate::store::OdometerStore;

/// Distance may jitter backwards by up to this much without being treated
/// as a rewind.
pub const REWIND_TOLERANCE: f32 = 25.0;

/// Assumed frame interval for dead-reckoning while the game's distance
/// counter is frozen during staging.
const FRAME_INTERVAL: f32 = 1.0 / 30.0;

/// Above this velocity with distance pinned at zero, the car is rolling on
/// a staging grid and distance is dead-reckoned.
const STAGING_VELOCITY: f32 = 5.0;

/// The odometer engine for the active vehicle.
pub struct Odometer {
    vehicle_id: i32,
    total: f32,
    offset: f32,
    distance: f32,
    prev_velocity: Option<f32>,
}

impl Odometer {
    pub fn new() -> Self {
        Self { vehicle_id: 0, total: 0.0, offset: 0.0, distance: 0.0, prev_velocity: None }
    }

    /// The current cumulative reading: persisted total plus in-race travel.
    pub fn reading(&self) -> f32 {
        self.total + self.distance - self.offset
    }

    /// Feeds one frame's distance/velocity and returns the updated reading.
    pub fn update(
        &mut self,
        store: &OdometerStore,
        distance: f32,
        vehicle_id: i32,
        velocity: f32,
    ) -> f32 {
        if self.vehicle_id <= 0 || self.vehicle_id != vehicle_id {
            // Vehicle changed (or first observation): bank the previous
            // vehicle's travel, load the new vehicle's total.
            self.flush(store);
            self.vehicle_id = vehicle_id;
            self.total = store.load(vehicle_id).unwrap_or_else(|err| {
                debug!(vehicle = vehicle_id, error = %err, "no persisted odometer, starting at 0");
                0.0
            });
            self.offset = distance;
            self.distance = distance;
            self.prev_velocity = None;
        } else if distance == 0.0 && velocity > STAGING_VELOCITY {
            // Staging/rolling start: the game's counter is frozen at zero.
            // Dead-reckon, but only when the velocity sample is new, so a
            // repeated frame is not counted twice.
            self.offset = 0.0;
            if self.prev_velocity != Some(velocity) {
                self.distance += velocity * FRAME_INTERVAL;
            }
            self.prev_velocity = Some(velocity);
        } else if distance == 0.0 && self.prev_velocity.is_some() {
            // Staging ended while the counter is still zero: bank the
            // dead-reckoned travel.
            self.flush(store);
            self.offset = 0.0;
            self.distance = 0.0;
            self.prev_velocity = None;
        } else if self.distance - REWIND_TOLERANCE > distance {
            // Rewind: bank what was actually driven, restart the baseline
            // at the rewound position. Backward travel never counts.
            self.flush(store);
            self.offset = distance;
            self.distance = distance;
            self.prev_velocity = None;
        } else {
            self.prev_velocity = None;
            self.distance = distance;
        }

        if distance < 0.0 {
            // Paused/menu telemetry: no progress counted.
            self.offset = 0.0;
            self.distance = 0.0;
            self.total
        } else {
            self.reading()
        }
    }

    /// Banks the pending in-race delta into the persisted total. A flush
    /// that would lower the stored total is rejected and logged.
    pub fn flush(&mut self, store: &OdometerStore) {
        if self.vehicle_id <= 0 {
            return;
        }
        let pending = self.distance - self.offset;
        if pending < 0.0 {
            warn!(
                vehicle = self.vehicle_id,
                pending, "odometer flush would lower stored total, rejected"
            );
            return;
        }
        self.total += pending;
        self.offset = self.distance;
        if let Err(err) = store.save(self.vehicle_id, self.total) {
            warn!(vehicle = self.vehicle_id, error = %err, "failed to persist odometer");
        }
    }

    /// Flushes and unbinds the vehicle; the next frame rebinds and reloads.
    /// Called when the source leaves race state.
    pub fn release(&mut self, store: &OdometerStore) {
        self.flush(store);
        self.vehicle_id = 0;
        self.offset = 0.0;
        self.distance = 0.0;
        self.prev_velocity = None;
    }
}

impl Default for Odometer {
    fn default() -> Self {
        Self::new()
    }
}
