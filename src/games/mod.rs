//! Per-game ingest loops
//!
//! Each supported game family implements the [`Game`] trait: a cheap id
//! match for dispatch plus the loop that owns the socket and feeds decoded
//! frames through the family's engines. Exactly one family runs per
//! process, selected once at startup.
//!
//! Forza titles drive the split/odometer engines; Assetto Corsa drives run
//! detection; Dirt titles and the generic fallback decode-and-publish with
//! light field fixups.

mod assetto;
mod dirt;
mod forza;
mod generic;

pub use assetto::AssettoGame;
pub use dirt::DirtGame;
pub use forza::ForzaGame;
pub use generic::GenericGame;

use tokio::net::UdpSocket;
use tracing::debug;

use crate::autocross::ControlHandle;
use crate::error::{Result, TelemetryError};
use crate::frame::Frame;
use crate::ingest::ShortFrameTracker;
use crate::publisher::SnapshotPublisher;
use crate::schema::FrameSchema;
use crate::store::{OdometerStore, RunStore, SplitStore};
use crate::timing::SplitMode;

/// Everything a game loop needs besides its socket.
pub struct GameContext {
    pub schema: FrameSchema,
    pub split_mode: SplitMode,
    pub publisher: SnapshotPublisher,
    pub control: ControlHandle,
    pub split_store: SplitStore,
    pub odometer_store: OdometerStore,
    pub run_store: RunStore,
}

/// A game family's ingest loop.
#[async_trait::async_trait]
pub trait Game: Send {
    /// Human-readable title for startup logging.
    fn title(&self) -> String;

    /// Runs the ingest loop. Only returns on socket failure.
    async fn run(self: Box<Self>, socket: UdpSocket, ctx: GameContext) -> Result<()>;
}

/// Selects the game family for an id; unknown ids get the generic loop.
pub fn select(game_id: &str) -> Box<dyn Game> {
    if ForzaGame::matches(game_id) {
        Box::new(ForzaGame::new(game_id))
    } else if AssettoGame::matches(game_id) {
        Box::new(AssettoGame)
    } else if DirtGame::matches(game_id) {
        Box::new(DirtGame::new(game_id))
    } else {
        Box::new(GenericGame::new(game_id))
    }
}

/// Receives one datagram and decodes it. Short datagrams return `Ok(None)`
/// after updating the tracker (clearing the snapshot once the run of them
/// is long enough); socket errors end the loop.
pub(crate) async fn next_frame(
    socket: &UdpSocket,
    buf: &mut [u8],
    schema: &FrameSchema,
    shorts: &mut ShortFrameTracker,
    publisher: &SnapshotPublisher,
) -> Result<Option<Frame>> {
    let len = socket.recv(buf).await.map_err(|err| TelemetryError::Socket {
        details: "udp receive failed".into(),
        source: err,
    })?;

    match Frame::decode(schema, &buf[..len]) {
        Ok(frame) => {
            shorts.record_good();
            Ok(Some(frame))
        }
        Err(err) if err.is_short_frame() => {
            debug!(%err, "dropping short datagram");
            if shorts.record_short() {
                publisher.clear().await;
            }
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// JSON number from an f32, `null` for non-finite values.
pub(crate) fn json_f32(value: f32) -> serde_json::Value {
    serde_json::Number::from_f64(f64::from(value))
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
