//! Error types for telemetry processing.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context. The split between variants mirrors how failures are handled at
//! runtime: schema problems are fatal at startup, short frames are counted
//! and survived, storage failures are logged and ingest continues.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("schema error in {path}: {details}")]
    Schema {
        path: PathBuf,
        details: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("short frame: got {actual} bytes, schema needs {expected}")]
    ShortFrame { expected: usize, actual: usize },

    #[error("field '{field}' not found in frame")]
    FieldNotFound { field: String },

    #[error("type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("storage error at {path}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage format error at {path}: {details}")]
    StorageFormat { path: PathBuf, details: String },

    #[error("socket error: {details}")]
    Socket {
        details: String,
        #[source]
        source: std::io::Error,
    },
}

impl TelemetryError {
    /// Helper constructor for schema format errors (no io cause).
    pub fn schema_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TelemetryError::Schema { path: path.into(), details: details.into(), source: None }
    }

    /// Helper constructor for schema files that could not be read.
    pub fn schema_io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TelemetryError::Schema {
            path: path.into(),
            details: "failed to read schema file".into(),
            source: Some(source),
        }
    }

    /// Helper constructor for storage errors with path context.
    pub fn storage_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TelemetryError::Storage { path: path.into(), source }
    }

    /// Helper constructor for storage files whose contents did not parse.
    pub fn storage_format_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TelemetryError::StorageFormat { path: path.into(), details: details.into() }
    }

    /// Returns true when this error is the short-frame condition, which the
    /// ingest loop counts rather than treats as a failure.
    pub fn is_short_frame(&self) -> bool {
        matches!(self, TelemetryError::ShortFrame { .. })
    }
}
