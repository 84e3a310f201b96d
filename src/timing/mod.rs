//! Live timing engines
//!
//! Both engines are explicit state objects fed once per decoded frame by a
//! game loop; neither owns a socket or a thread. Persistence happens inside
//! the engines on state-transition edges (lap end, vehicle change, rewind),
//! never per frame.

pub mod odometer;
pub mod splits;

pub use odometer::Odometer;
pub use splits::{SplitMode, SplitTimer};

/// Identifies the active comparison scope for split baselines.
///
/// A change in any member invalidates cached baselines and forces a reload
/// from the split store. `-1` members mean "unknown" — Horizon-era titles
/// never report a track, and split persistence is suppressed for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleContext {
    pub vehicle_id: i32,
    pub track_id: i32,
    pub vehicle_class: i32,
}

impl VehicleContext {
    pub const UNKNOWN: Self = Self { vehicle_id: -1, track_id: -1, vehicle_class: -1 };

    /// True when the source reported a real track, which is what gates
    /// persisting bests (a `-1` track would pollute the store).
    pub fn has_track(&self) -> bool {
        self.track_id != -1
    }
}

impl Default for VehicleContext {
    fn default() -> Self {
        Self::UNKNOWN
    }
}
