//! Odometer storage
//!
//! One text file per vehicle under `odometers/<vehicle-id>` holding the
//! persisted cumulative distance as a decimal float.

use std::path::{Path, PathBuf};

use crate::error::{Result, TelemetryError};

/// Path-addressed storage for per-vehicle cumulative distance.
#[derive(Debug, Clone)]
pub struct OdometerStore {
    root: PathBuf,
}

impl OdometerStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { root: data_dir.as_ref().join("odometers") }
    }

    fn path(&self, vehicle_id: i32) -> PathBuf {
        self.root.join(vehicle_id.to_string())
    }

    /// Loads a vehicle's persisted total.
    pub fn load(&self, vehicle_id: i32) -> Result<f32> {
        let path = self.path(vehicle_id);
        let line = super::read_first_line(&path)?;
        line.parse().map_err(|_| {
            TelemetryError::storage_format_error(&path, format!("not a distance: '{line}'"))
        })
    }

    /// Persists a vehicle's total.
    pub fn save(&self, vehicle_id: i32, total: f32) -> Result<()> {
        super::write_text(&self.path(vehicle_id), &format!("{total}"))
    }
}
