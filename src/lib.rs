//! Schema-driven UDP telemetry decoder and live timing engine for racing
//! simulators.
//!
//! Trackside listens for the fixed-layout datagrams that Forza, Dirt and
//! Assetto Corsa titles stream over UDP, decodes them against a declared
//! packet schema, and derives live performance signals on top:
//!
//! - **Lap-split delta**: the current lap sampled every 12 distance units
//!   against a stored reference lap (personal, class or session best)
//! - **Odometer**: a per-vehicle lifetime distance that survives staging,
//!   pauses and rewinds
//! - **Run detection**: start/end of discrete timed runs derived from the
//!   lap timer alone, with persisted run records and a top-10 leaderboard
//!
//! The latest derived frame is published as JSON behind a small HTTP
//! surface, which also carries the arm/disarm control for run recording.
//!
//! # Example (decode one frame)
//!
//! ```rust
//! use trackside::{Frame, FrameSchema};
//!
//! let schema = FrameSchema::parse("s32 IsRaceOn\nf32 Speed\n", "inline")?;
//! let mut packet = Vec::new();
//! packet.extend_from_slice(&1i32.to_le_bytes());
//! packet.extend_from_slice(&42.5f32.to_le_bytes());
//!
//! let frame = Frame::decode(&schema, &packet)?;
//! assert_eq!(frame.f32("Speed"), Some(42.5));
//! # Ok::<(), trackside::TelemetryError>(())
//! ```

pub mod autocross;
mod error;
mod frame;
pub mod games;
pub mod http;
pub mod ingest;
pub mod publisher;
pub mod schema;
pub mod store;
pub mod timing;
pub mod types;

// Core exports
pub use error::{Result, TelemetryError};
pub use frame::Frame;
pub use schema::{FieldInfo, FrameSchema};
pub use types::{FieldType, Value};

// Engine exports
pub use autocross::{ControlHandle, RunDetector};
pub use publisher::SnapshotPublisher;
pub use timing::{Odometer, SplitMode, SplitTimer, VehicleContext};
