//! Frame decoding
//!
//! A [`Frame`] is one datagram's worth of decoded fields: a flat name →
//! typed-value table produced against a [`FrameSchema`] and discarded after
//! the engines and publisher have consumed it. Decoding carries no state
//! between calls.

use std::collections::HashMap;

use crate::error::{Result, TelemetryError};
use crate::schema::FrameSchema;
use crate::types::{FieldType, Value};

/// A single decoded telemetry frame supporting by-name lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    values: HashMap<String, Value>,
}

impl Frame {
    /// Decodes one datagram against the schema.
    ///
    /// A buffer shorter than the schema's total length is rejected whole
    /// with [`TelemetryError::ShortFrame`]; there are no per-field errors.
    /// Trailing bytes beyond the schema length are ignored, matching the
    /// games that append undocumented data to their packets.
    pub fn decode(schema: &FrameSchema, data: &[u8]) -> Result<Self> {
        if data.len() < schema.total_length() {
            return Err(TelemetryError::ShortFrame {
                expected: schema.total_length(),
                actual: data.len(),
            });
        }

        let mut values = HashMap::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let b = &data[field.offset..field.end_offset()];
            let value = match field.field_type {
                FieldType::Int8 => Value::Int8(b[0] as i8),
                FieldType::UInt8 => Value::UInt8(b[0]),
                FieldType::Int16 => Value::Int16(i16::from_le_bytes([b[0], b[1]])),
                FieldType::UInt16 => Value::UInt16(u16::from_le_bytes([b[0], b[1]])),
                FieldType::Int32 => Value::Int32(i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                FieldType::UInt32 => Value::UInt32(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                FieldType::Int64 => Value::Int64(i64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])),
                FieldType::UInt64 => Value::UInt64(u64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])),
                FieldType::Float32 => Value::Float32(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                FieldType::Float64 => Value::Float64(f64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])),
                FieldType::Bool => Value::Bool(b[0] != 0),
                // Opaque padding: no field is produced.
                FieldType::Composite12 => continue,
            };
            values.insert(field.name.clone(), value);
        }

        Ok(Self { values })
    }

    /// Raw value lookup by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Convenience typed helpers
    pub fn f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Value::as_f32)
    }
    pub fn i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_i32)
    }
    pub fn u32(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(Value::as_u32)
    }
    pub fn u16(&self, name: &str) -> Option<u16> {
        self.get(name).and_then(Value::as_u16)
    }
    pub fn u8(&self, name: &str) -> Option<u8> {
        self.get(name).and_then(Value::as_u8)
    }
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Number of decoded fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the frame as one flat JSON object. Game loops add their
    /// derived fields to the returned map before publishing.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values.iter().map(|(name, value)| (name.clone(), value.to_json())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> FrameSchema {
        FrameSchema::parse(
            "s32 IsRaceOn\nf32 Speed\nu16 LapNumber\nu8 Gear\ns8 Steer\nbool Handbrake\n",
            "test.dat",
        )
        .unwrap()
    }

    fn test_buffer() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&42.5f32.to_le_bytes());
        data.extend_from_slice(&7u16.to_le_bytes());
        data.push(3);
        data.push((-12i8) as u8);
        data.push(2); // bool: any non-zero byte is true
        data
    }

    #[test]
    fn frame_basic_lookup() {
        let frame = Frame::decode(&test_schema(), &test_buffer()).unwrap();

        assert_eq!(frame.i32("IsRaceOn"), Some(1));
        assert!((frame.f32("Speed").unwrap() - 42.5).abs() < 1e-6);
        assert_eq!(frame.u16("LapNumber"), Some(7));
        assert_eq!(frame.u8("Gear"), Some(3));
        assert_eq!(frame.bool("Handbrake"), Some(true));
        assert_eq!(frame.f32("Missing"), None);
    }

    #[test]
    fn short_buffer_is_rejected_whole() {
        let schema = test_schema();
        let mut data = test_buffer();
        data.truncate(5);

        let err = Frame::decode(&schema, &data).unwrap_err();
        match err {
            TelemetryError::ShortFrame { expected, actual } => {
                assert_eq!(expected, schema.total_length());
                assert_eq!(actual, 5);
            }
            other => panic!("expected ShortFrame, got {other:?}"),
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut data = test_buffer();
        data.extend_from_slice(&[0xAA; 32]);
        let frame = Frame::decode(&test_schema(), &data).unwrap();
        assert_eq!(frame.u16("LapNumber"), Some(7));
    }

    #[test]
    fn composite_block_decodes_to_nothing() {
        let schema = FrameSchema::parse("f32 Before\nhzn Mystery\nf32 After\n", "test.dat").unwrap();
        let mut data = Vec::new();
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&2.0f32.to_le_bytes());

        let frame = Frame::decode(&schema, &data).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get("Mystery"), None);
        assert_eq!(frame.f32("After"), Some(2.0));
    }

    #[test]
    fn json_object_is_flat() {
        let frame = Frame::decode(&test_schema(), &test_buffer()).unwrap();
        let map = frame.to_json();
        assert_eq!(map.get("IsRaceOn"), Some(&serde_json::json!(1)));
        assert_eq!(map.get("Handbrake"), Some(&serde_json::json!(true)));
    }
}
