//! Live snapshot publishing
//!
//! The ingest loop writes the most recent derived field table as a JSON
//! string; the HTTP surface reads it. One mutex, held only across the read
//! or write, never across I/O. A snapshot older than the freshness window
//! reads back as absent so downstream pollers can tell "no data" from
//! "stale data".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Snapshots older than this read back as absent.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Snapshot {
    json: Option<String>,
    published_at: Option<Instant>,
}

/// Cloneable handle to the latest published snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPublisher {
    inner: Arc<Mutex<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot and stamps it fresh.
    pub async fn publish(&self, json: String) {
        let mut snapshot = self.inner.lock().await;
        snapshot.json = Some(json);
        snapshot.published_at = Some(Instant::now());
    }

    /// Clears the snapshot; readers see absent until the next publish.
    pub async fn clear(&self) {
        let mut snapshot = self.inner.lock().await;
        snapshot.json = None;
        snapshot.published_at = None;
    }

    /// The latest snapshot, or `None` when cleared or stale.
    pub async fn latest(&self) -> Option<String> {
        let snapshot = self.inner.lock().await;
        let published_at = snapshot.published_at?;
        if published_at.elapsed() > FRESHNESS_WINDOW {
            return None;
        }
        snapshot.json.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_read() {
        let publisher = SnapshotPublisher::new();
        assert_eq!(publisher.latest().await, None);

        publisher.publish(r#"{"Speed":42.5}"#.to_string()).await;
        assert_eq!(publisher.latest().await.as_deref(), Some(r#"{"Speed":42.5}"#));
    }

    #[tokio::test]
    async fn clear_makes_snapshot_absent() {
        let publisher = SnapshotPublisher::new();
        publisher.publish("{}".to_string()).await;
        publisher.clear().await;
        assert_eq!(publisher.latest().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_goes_stale_after_the_window() {
        let publisher = SnapshotPublisher::new();
        publisher.publish("{}".to_string()).await;

        tokio::time::advance(Duration::from_millis(4900)).await;
        assert!(publisher.latest().await.is_some());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(publisher.latest().await, None);

        // A fresh publish revives it.
        publisher.publish("{}".to_string()).await;
        assert!(publisher.latest().await.is_some());
    }
}
