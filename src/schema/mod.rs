//! Packet-format schema loading
//!
//! A packet-format file declares one field per line:
//!
//! ```text
//! s32 IsRaceOn
//! u32 TimestampMS ;game-supplied, milliseconds
//! f32 EngineMaxRpm
//! ```
//!
//! Fields are packed back to back in declaration order, so compiling a
//! schema is a single pass accumulating byte offsets. The total length is
//! the minimum datagram size the decoder will accept.
//!
//! # Schema Building Process
//!
//! 1. Read the file line by line; drop `;`-comments and blank lines
//! 2. Parse `<type-tag> <name>` per remaining line
//! 3. Assign each field the running offset, advance by the type's size
//! 4. Reject unknown type tags (fatal — a misdeclared schema would silently
//!    misalign every later field)

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::types::FieldType;

/// One field's placement within a telemetry frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name as declared in the packet-format file
    pub name: String,
    /// Decoded data type
    pub field_type: FieldType,
    /// Byte offset of the field's first byte within the frame
    pub offset: usize,
}

impl FieldInfo {
    /// Byte offset one past the field's last byte.
    pub fn end_offset(&self) -> usize {
        self.offset + self.field_type.size()
    }
}

/// Compiled frame schema: ordered fields plus the total frame length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSchema {
    fields: Vec<FieldInfo>,
    total_length: usize,
}

impl FrameSchema {
    /// Loads and compiles a packet-format file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|err| TelemetryError::schema_io_error(path, err))?;
        let schema = Self::parse(&text, path)?;
        debug!(
            path = %path.display(),
            fields = schema.fields.len(),
            frame_len = schema.total_length,
            "compiled packet schema"
        );
        Ok(schema)
    }

    /// Compiles schema text. `path` is only used for error context.
    pub fn parse(text: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut fields = Vec::new();
        let mut offset = 0usize;

        for (line_no, raw_line) in text.lines().enumerate() {
            // Everything after ';' is a comment, including whole-line comments.
            let line = raw_line.split(';').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let tag = parts.next().unwrap_or("");
            let name = parts.next().ok_or_else(|| {
                TelemetryError::schema_error(
                    path,
                    format!("line {}: missing field name", line_no + 1),
                )
            })?;

            let field_type = FieldType::from_tag(tag).ok_or_else(|| {
                TelemetryError::schema_error(
                    path,
                    format!("line {}: unknown data type '{}'", line_no + 1, tag),
                )
            })?;

            fields.push(FieldInfo { name: name.to_string(), field_type, offset });
            offset += field_type.size();
        }

        if fields.is_empty() {
            return Err(TelemetryError::schema_error(path, "no field declarations"));
        }

        Ok(Self { fields, total_length: offset })
    }

    /// Fields in declaration (wire) order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Total frame length in bytes; datagrams shorter than this are rejected.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Linear lookup by field name. Schemas are small (tens of fields) and
    /// this is only used off the hot path; the decoder walks `fields()`.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}
