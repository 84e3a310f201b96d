//! UDP ingest helpers
//!
//! The listener is connectionless: every datagram is one telemetry frame.
//! Frames are processed strictly in arrival order by a single loop; the
//! only reason a frame is dropped is being shorter than the schema.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::info;

use crate::error::{Result, TelemetryError};

/// Receive buffer size; no supported game sends datagrams near this.
pub const RECV_BUFFER_LEN: usize = 1500;

/// More than this many consecutive short datagrams clears the snapshot.
pub const SHORT_FRAME_LIMIT: u32 = 5;

/// Binds the ingest socket on all interfaces.
pub async fn bind(port: u16) -> Result<UdpSocket> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let socket = UdpSocket::bind(addr).await.map_err(|err| TelemetryError::Socket {
        details: format!("failed to bind udp listener on {addr}"),
        source: err,
    })?;
    info!(%addr, "udp ingest listening");
    Ok(socket)
}

/// Counts consecutive short datagrams. A run of them usually means the
/// wrong game (or schema) is pointed at the port; after the limit the
/// published snapshot is cleared so downstream readers notice, while
/// ingest itself keeps going.
#[derive(Debug, Default)]
pub struct ShortFrameTracker {
    consecutive: u32,
}

impl ShortFrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a short datagram; returns true once the run of them is long
    /// enough that the caller should clear the published snapshot.
    pub fn record_short(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive > SHORT_FRAME_LIMIT
    }

    /// Records a well-formed datagram, ending any run.
    pub fn record_good(&mut self) {
        self.consecutive = 0;
    }
}
