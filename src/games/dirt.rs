//! Dirt family loop
//!
//! Pure decode-and-publish with fixups that make the Dirt wire format look
//! like the dashboards expect: RPM fields arrive pre-divided by ten, the
//! lap number is zero-based, and the format carries no race flag or gear
//! constants of its own.

use tokio::net::UdpSocket;

use super::{Game, GameContext, json_f32, next_frame};
use crate::error::Result;
use crate::ingest::{RECV_BUFFER_LEN, ShortFrameTracker};

const RPM_FIELDS: [&str; 3] = ["CurrentEngineRpm", "EngineMaxRpm", "EngineIdleRpm"];

pub struct DirtGame {
    game_id: String,
}

impl DirtGame {
    pub fn matches(game_id: &str) -> bool {
        matches!(game_id, "DR" | "DR2" | "Dirt3" | "Dirt4" | "Dirt5")
    }

    pub fn new(game_id: &str) -> Self {
        Self { game_id: game_id.to_string() }
    }
}

#[async_trait::async_trait]
impl Game for DirtGame {
    fn title(&self) -> String {
        match self.game_id.as_str() {
            "DR" => "Dirt Rally",
            "DR2" => "Dirt Rally 2.0",
            "Dirt3" => "Dirt 3",
            "Dirt4" => "Dirt 4",
            "Dirt5" => "Dirt 5",
            _ => "Dirt",
        }
        .to_string()
    }

    async fn run(self: Box<Self>, socket: UdpSocket, ctx: GameContext) -> Result<()> {
        let mut shorts = ShortFrameTracker::new();
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let Some(frame) =
                next_frame(&socket, &mut buf, &ctx.schema, &mut shorts, &ctx.publisher).await?
            else {
                continue;
            };

            let mut json = frame.to_json();
            for field in RPM_FIELDS {
                if let Some(rpm) = frame.f32(field) {
                    json.insert(field.into(), json_f32(rpm * 10.0));
                }
            }
            if let Some(lap) = frame.f32("LapNumber") {
                json.insert("LapNumber".into(), json_f32(lap + 1.0));
            }
            json.insert("GearNeutral".into(), 0.into());
            json.insert("GearReverse".into(), (-1).into());
            json.insert("IsRaceOn".into(), true.into());

            ctx.publisher.publish(serde_json::Value::Object(json).to_string()).await;
        }
    }
}
