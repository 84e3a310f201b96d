//! Generic fallback loop
//!
//! Decode-and-publish for any game id without a dedicated family. The
//! only fixup is a synthetic `IsRaceOn` so dashboards built for Forza
//! treat the stream as live.

use tokio::net::UdpSocket;

use super::{Game, GameContext, next_frame};
use crate::error::Result;
use crate::ingest::{RECV_BUFFER_LEN, ShortFrameTracker};

pub struct GenericGame {
    game_id: String,
}

impl GenericGame {
    pub fn new(game_id: &str) -> Self {
        Self { game_id: game_id.to_string() }
    }
}

#[async_trait::async_trait]
impl Game for GenericGame {
    fn title(&self) -> String {
        match self.game_id.as_str() {
            "WRC" => "EA WRC".to_string(),
            other => format!("{other} Generic"),
        }
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
            json.insert("IsRaceOn".into(), true.into());
            ctx.publisher.publish(serde_json::Value::Object(json).to_string()).await;
        }
    }
}
