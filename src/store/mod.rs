//! Durable path-addressed stores
//!
//! Everything the engines persist lives under one data directory as small
//! JSON or single-value text files, written whole on each save. Writes are
//! synchronous and fire only on state-transition edges, so plain `std::fs`
//! is the right tool even though the ingest loop is async. There is no
//! cross-file transactionality; the next successful write carries the
//! latest state forward.

mod odometer;
mod runs;
mod splits;

pub use odometer::OdometerStore;
pub use runs::RunStore;
pub use splits::SplitStore;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, TelemetryError};

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| TelemetryError::storage_error(path, err))?;
    }
    let data = serde_json::to_vec_pretty(value)
        .map_err(|err| TelemetryError::storage_format_error(path, err.to_string()))?;
    fs::write(path, data).map_err(|err| TelemetryError::storage_error(path, err))
}

/// Reads and parses a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).map_err(|err| TelemetryError::storage_error(path, err))?;
    serde_json::from_slice(&data)
        .map_err(|err| TelemetryError::storage_format_error(path, err.to_string()))
}

/// Writes a single-value text file, creating parent directories.
pub(crate) fn write_text(path: &Path, value: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| TelemetryError::storage_error(path, err))?;
    }
    fs::write(path, value).map_err(|err| TelemetryError::storage_error(path, err))
}

/// Reads the first line of a single-value text file, trimmed.
pub(crate) fn read_first_line(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|err| TelemetryError::storage_error(path, err))?;
    let line = text.lines().next().unwrap_or("").trim().to_string();
    if line.is_empty() {
        return Err(TelemetryError::storage_format_error(path, "file is empty"));
    }
    Ok(line)
}
