//! Telemetry field type definitions
//!
//! The type tags match the packet-format files shipped by the supported
//! games: fixed-width little-endian scalars plus the opaque 12-byte block
//! some Horizon-era formats carry.

use serde::{Deserialize, Serialize};

/// Supported telemetry data types, one per schema type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 8-bit signed integer (`s8`)
    Int8,
    /// 8-bit unsigned integer (`u8`)
    UInt8,
    /// 16-bit signed integer (`s16`)
    Int16,
    /// 16-bit unsigned integer (`u16`)
    UInt16,
    /// 32-bit signed integer (`s32`)
    Int32,
    /// 32-bit unsigned integer (`u32`)
    UInt32,
    /// 64-bit signed integer (`s64`)
    Int64,
    /// 64-bit unsigned integer (`u64`)
    UInt64,
    /// 32-bit floating point (`f32`)
    Float32,
    /// 64-bit floating point (`f64`)
    Float64,
    /// Single-byte boolean (`bool`), non-zero is true
    Bool,
    /// Opaque 12-byte block (`hzn`); occupies offset space, decodes to nothing
    Composite12,
}

impl FieldType {
    /// Returns the size in bytes this type occupies in a frame.
    pub const fn size(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 | FieldType::Bool => 1,
            FieldType::Int16 | FieldType::UInt16 => 2,
            FieldType::Int32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::Int64 | FieldType::UInt64 | FieldType::Float64 => 8,
            FieldType::Composite12 => 12,
        }
    }

    /// Parses a schema-file type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "s8" => Some(FieldType::Int8),
            "u8" => Some(FieldType::UInt8),
            "s16" => Some(FieldType::Int16),
            "u16" => Some(FieldType::UInt16),
            "s32" => Some(FieldType::Int32),
            "u32" => Some(FieldType::UInt32),
            "s64" => Some(FieldType::Int64),
            "u64" => Some(FieldType::UInt64),
            "f32" => Some(FieldType::Float32),
            "f64" => Some(FieldType::Float64),
            "bool" => Some(FieldType::Bool),
            "hzn" => Some(FieldType::Composite12),
            _ => None,
        }
    }

    /// The schema-file tag for this type.
    pub const fn tag(&self) -> &'static str {
        match self {
            FieldType::Int8 => "s8",
            FieldType::UInt8 => "u8",
            FieldType::Int16 => "s16",
            FieldType::UInt16 => "u16",
            FieldType::Int32 => "s32",
            FieldType::UInt32 => "u32",
            FieldType::Int64 => "s64",
            FieldType::UInt64 => "u64",
            FieldType::Float32 => "f32",
            FieldType::Float64 => "f64",
            FieldType::Bool => "bool",
            FieldType::Composite12 => "hzn",
        }
    }
}

/// Runtime value type that can hold any decoded telemetry scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
}

impl Value {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::UInt8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Renders this value as a flat JSON scalar. Non-finite floats become
    /// `null` since JSON has no representation for them.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Number, Value as Json};
        match *self {
            Value::Int8(v) => Json::from(v),
            Value::UInt8(v) => Json::from(v),
            Value::Int16(v) => Json::from(v),
            Value::UInt16(v) => Json::from(v),
            Value::Int32(v) => Json::from(v),
            Value::UInt32(v) => Json::from(v),
            Value::Int64(v) => Json::from(v),
            Value::UInt64(v) => Json::from(v),
            Value::Float32(v) => {
                Number::from_f64(f64::from(v)).map(Json::Number).unwrap_or(Json::Null)
            }
            Value::Float64(v) => Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null),
            Value::Bool(v) => Json::from(v),
        }
    }
}
