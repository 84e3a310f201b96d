//! Assetto Corsa loop
//!
//! Assetto's lap counter has no segment semantics worth splitting on, so
//! this family publishes the decoded frame as-is and feeds the run
//! detector instead. The plugin reports lap times in milliseconds and uses
//! a Y-up coordinate system; samples are normalized here so run files are
//! uniform (Z becomes the top-down map's second axis, Y the elevation).

use tokio::net::UdpSocket;

use super::{Game, GameContext, next_frame};
use crate::autocross::{RunDetector, RunInput, RunSample};
use crate::error::Result;
use crate::ingest::{RECV_BUFFER_LEN, ShortFrameTracker};

pub struct AssettoGame;

impl AssettoGame {
    pub fn matches(game_id: &str) -> bool {
        game_id == "AC"
    }
}

#[async_trait::async_trait]
impl Game for AssettoGame {
    fn title(&self) -> String {
        "Assetto Corsa".to_string()
    }

    async fn run(self: Box<Self>, socket: UdpSocket, ctx: GameContext) -> Result<()> {
        let mut detector = RunDetector::new();
        let mut shorts = ShortFrameTracker::new();
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let Some(frame) =
                next_frame(&socket, &mut buf, &ctx.schema, &mut shorts, &ctx.publisher).await?
            else {
                continue;
            };

            ctx.publisher.publish(serde_json::Value::Object(frame.to_json()).to_string()).await;

            let lap_timer = frame.i32("CurrentLap").map(|ms| ms as f32 / 1000.0).unwrap_or(0.0);
            let sample = RunSample {
                timestamp: 0.0, // stamped by the detector on append
                brake: frame.f32("Brake").unwrap_or(0.0),
                throttle: frame.f32("Accel").unwrap_or(0.0),
                lat_g: frame.f32("AccelerationX").unwrap_or(0.0),
                long_g: frame.f32("AccelerationZ").unwrap_or(0.0),
                speed: frame.f32("Speed").unwrap_or(0.0),
                pos_x: frame.f32("PositionX").unwrap_or(0.0),
                pos_y: frame.f32("PositionZ").unwrap_or(0.0),
                pos_z: frame.f32("PositionY").unwrap_or(0.0),
                lap_timer,
            };

            detector
                .process(&ctx.control, &ctx.run_store, RunInput {
                    lap_timer,
                    last_lap: frame.i32("LastLap").map(|ms| ms as f32 / 1000.0),
                    vehicle_id: frame.i32("CarID").unwrap_or(-1),
                    track_id: frame.i32("TrackID").unwrap_or(-1),
                    sample,
                })
                .await;
        }
    }
}
