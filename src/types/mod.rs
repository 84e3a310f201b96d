//! Core telemetry value types

mod value;

pub use value::{FieldType, Value};
