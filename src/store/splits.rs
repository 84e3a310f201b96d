//! Split-sequence storage
//!
//! Layout under the data directory:
//!
//! ```text
//! splits/<class>/<vehicle>/<track>.json   personal-best splits, JSON [f32]
//! splits/<class>/<track>                  vehicle id owning the track best
//! ```
//!
//! The track-best record is just the owning vehicle's id; its splits are
//! that vehicle's own personal-best file.

use std::path::{Path, PathBuf};

use crate::error::{Result, TelemetryError};
use crate::timing::VehicleContext;

/// Path-addressed storage for split baselines.
#[derive(Debug, Clone)]
pub struct SplitStore {
    root: PathBuf,
}

impl SplitStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { root: data_dir.as_ref().join("splits") }
    }

    fn personal_path(&self, context: VehicleContext) -> PathBuf {
        self.root
            .join(context.vehicle_class.to_string())
            .join(context.vehicle_id.to_string())
            .join(format!("{}.json", context.track_id))
    }

    fn owner_path(&self, context: VehicleContext) -> PathBuf {
        self.root.join(context.vehicle_class.to_string()).join(context.track_id.to_string())
    }

    /// Loads the personal-best splits for a vehicle/track/class context.
    pub fn load_personal(&self, context: VehicleContext) -> Result<Vec<f32>> {
        super::read_json(&self.personal_path(context))
    }

    /// Persists the personal-best splits for a context.
    pub fn save_personal(&self, context: VehicleContext, splits: &[f32]) -> Result<()> {
        super::write_json(&self.personal_path(context), &splits)
    }

    /// Loads the track-best record: the owning vehicle id and that
    /// vehicle's splits for this track/class.
    pub fn load_track_best(&self, context: VehicleContext) -> Result<(i32, Vec<f32>)> {
        let owner_path = self.owner_path(context);
        let line = super::read_first_line(&owner_path)?;
        let vehicle_id: i32 = line.parse().map_err(|_| {
            TelemetryError::storage_format_error(
                &owner_path,
                format!("not a vehicle id: '{line}'"),
            )
        })?;

        let owner = VehicleContext { vehicle_id, ..context };
        let splits = self.load_personal(owner)?;
        if splits.is_empty() {
            return Err(TelemetryError::storage_format_error(
                self.personal_path(owner),
                "empty split sequence",
            ));
        }
        Ok((vehicle_id, splits))
    }

    /// Records `context`'s vehicle as the owner of the track best.
    pub fn save_track_best_owner(&self, context: VehicleContext) -> Result<()> {
        super::write_text(&self.owner_path(context), &context.vehicle_id.to_string())
    }
}
