//! Forza family loop
//!
//! Motorsport titles (FM, FM7) report a track ordinal and an `IsRaceOn`
//! flag, so splits persist per track and the engines idle in menus.
//! Horizon titles (FH5, FH4) have neither: splits stay session-scoped and
//! menu frames are recognized by their zeroed engine RPM instead.

use tokio::net::UdpSocket;

use super::{Game, GameContext, json_f32, next_frame};
use crate::error::Result;
use crate::ingest::{RECV_BUFFER_LEN, ShortFrameTracker};
use crate::timing::{Odometer, SplitMode, SplitTimer, VehicleContext};

pub struct ForzaGame {
    game_id: String,
    motorsport: bool,
}

impl ForzaGame {
    pub fn matches(game_id: &str) -> bool {
        matches!(game_id, "FM" | "FM7" | "FH5" | "FH4")
    }

    pub fn new(game_id: &str) -> Self {
        Self { game_id: game_id.to_string(), motorsport: matches!(game_id, "FM" | "FM7") }
    }
}

#[async_trait::async_trait]
impl Game for ForzaGame {
    fn title(&self) -> String {
        match self.game_id.as_str() {
            "FM" => "Forza Motorsport",
            "FM7" => "Forza Motorsport 7",
            "FH5" => "Forza Horizon 5",
            "FH4" => "Forza Horizon 4",
            _ => "Forza",
        }
        .to_string()
    }

    async fn run(self: Box<Self>, socket: UdpSocket, ctx: GameContext) -> Result<()> {
        let mode = if self.motorsport { ctx.split_mode } else { SplitMode::Session };
        let mut timer = SplitTimer::new(mode);
        let mut odometer = Odometer::new();
        let mut shorts = ShortFrameTracker::new();
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let Some(frame) =
                next_frame(&socket, &mut buf, &ctx.schema, &mut shorts, &ctx.publisher).await?
            else {
                continue;
            };

            // FH4 keeps streaming in certain menus; zeroed RPM marks those
            // frames (also covers pause and rewind screens).
            if !self.motorsport && frame.f32("CurrentEngineRpm") == Some(0.0) {
                continue;
            }

            let context = VehicleContext {
                vehicle_id: frame.i32("CarOrdinal").unwrap_or(-1),
                track_id: if self.motorsport {
                    frame.i32("TrackOrdinal").unwrap_or(-1)
                } else {
                    -1
                },
                vehicle_class: frame.i32("CarClass").unwrap_or(-1),
            };

            let mut json = frame.to_json();
            if frame.i32("IsRaceOn") == Some(1) {
                let distance = frame.f32("DistanceTraveled").unwrap_or(-1.0);
                let delta = timer.advance(
                    &ctx.split_store,
                    context,
                    distance,
                    frame.u16("LapNumber").unwrap_or(0),
                    frame.f32("CurrentLap").unwrap_or(0.0),
                    frame.f32("LastLap").unwrap_or(0.0),
                    frame.f32("SessionBestLap").unwrap_or(0.0),
                );
                let reading = odometer.update(
                    &ctx.odometer_store,
                    distance,
                    context.vehicle_id,
                    frame.f32("Speed").unwrap_or(0.0),
                );

                json.insert(
                    "Split".into(),
                    delta.map(json_f32).unwrap_or(serde_json::Value::Null),
                );
                json.insert("BestLap".into(), json_f32(timer.best_lap().unwrap_or(0.0)));
                json.insert("Odometer".into(), json_f32(reading));
            } else {
                // Menus/lobby: park the odometer so the next race rebinds,
                // and publish the derived fields as empty.
                odometer.release(&ctx.odometer_store);
                json.insert("Split".into(), serde_json::Value::Null);
                json.insert("BestLap".into(), json_f32(0.0));
                json.insert("Odometer".into(), json_f32(0.0));
            }

            ctx.publisher.publish(serde_json::Value::Object(json).to_string()).await;
        }
    }
}
