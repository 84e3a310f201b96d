//! End-to-end run detection: binary datagrams → decoded frames → detector,
//! the way the Assetto loop wires them together.

use trackside::autocross::{ControlHandle, RunDetector, RunInput, RunPhase, RunSample};
use trackside::schema::FrameSchema;
use trackside::store::RunStore;
use trackside::Frame;

const SCHEMA: &str = "\
s32 CurrentLap
s32 LastLap
f32 Speed
f32 Brake
f32 Accel
f32 AccelerationX
f32 AccelerationZ
f32 PositionX
f32 PositionY
f32 PositionZ
s32 CarID
s32 TrackID
";

fn encode(current_lap_ms: i32, last_lap_ms: i32, speed: f32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&current_lap_ms.to_le_bytes());
    data.extend_from_slice(&last_lap_ms.to_le_bytes());
    data.extend_from_slice(&speed.to_le_bytes());
    data.extend_from_slice(&0.3f32.to_le_bytes()); // Brake
    data.extend_from_slice(&0.7f32.to_le_bytes()); // Accel
    data.extend_from_slice(&1.1f32.to_le_bytes()); // AccelerationX
    data.extend_from_slice(&(-0.6f32).to_le_bytes()); // AccelerationZ
    data.extend_from_slice(&10.0f32.to_le_bytes()); // PositionX
    data.extend_from_slice(&2.0f32.to_le_bytes()); // PositionY
    data.extend_from_slice(&20.0f32.to_le_bytes()); // PositionZ
    data.extend_from_slice(&4i32.to_le_bytes()); // CarID
    data.extend_from_slice(&12i32.to_le_bytes()); // TrackID
    data
}

/// Builds the detector input exactly as the Assetto loop does.
fn input_from(frame: &Frame) -> RunInput {
    let lap_timer = frame.i32("CurrentLap").map(|ms| ms as f32 / 1000.0).unwrap_or(0.0);
    RunInput {
        lap_timer,
        last_lap: frame.i32("LastLap").map(|ms| ms as f32 / 1000.0),
        vehicle_id: frame.i32("CarID").unwrap_or(-1),
        track_id: frame.i32("TrackID").unwrap_or(-1),
        sample: RunSample {
            timestamp: 0.0,
            brake: frame.f32("Brake").unwrap_or(0.0),
            throttle: frame.f32("Accel").unwrap_or(0.0),
            lat_g: frame.f32("AccelerationX").unwrap_or(0.0),
            long_g: frame.f32("AccelerationZ").unwrap_or(0.0),
            speed: frame.f32("Speed").unwrap_or(0.0),
            pos_x: frame.f32("PositionX").unwrap_or(0.0),
            pos_y: frame.f32("PositionZ").unwrap_or(0.0),
            pos_z: frame.f32("PositionY").unwrap_or(0.0),
            lap_timer,
        },
    }
}

async fn feed(
    detector: &mut RunDetector,
    control: &ControlHandle,
    store: &RunStore,
    schema: &FrameSchema,
    current_lap_ms: i32,
    last_lap_ms: i32,
) {
    let frame = Frame::decode(schema, &encode(current_lap_ms, last_lap_ms, 25.0)).unwrap();
    detector.process(control, store, input_from(&frame)).await;
}

#[tokio::test]
async fn one_run_with_authoritative_last_lap() {
    let dir = tempfile::tempdir().unwrap();
    let schema = FrameSchema::parse(SCHEMA, "AC_packetformat.dat").unwrap();
    let store = RunStore::new(dir.path());
    let control = ControlHandle::new();
    control.arm("lot-a".into(), &store).await;

    let mut detector = RunDetector::new();
    for ms in [0, 0, 1200, 2400, 3600] {
        feed(&mut detector, &control, &store, &schema, ms, 0).await;
    }
    assert_eq!(detector.phase(), RunPhase::Recording);

    // Timer resets; the game reports 55.5s as the finished lap.
    feed(&mut detector, &control, &store, &schema, 0, 55_500).await;

    assert_eq!(detector.phase(), RunPhase::Armed);
    let board = store.load_leaderboard("lot-a").unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].lap_time, 55.5);
    assert_eq!(board[0].car_id, "4");
}

#[tokio::test]
async fn without_last_lap_the_buffered_timer_wins() {
    let dir = tempfile::tempdir().unwrap();
    let schema = FrameSchema::parse(SCHEMA, "AC_packetformat.dat").unwrap();
    let store = RunStore::new(dir.path());
    let control = ControlHandle::new();
    control.arm("lot-b".into(), &store).await;

    let mut detector = RunDetector::new();
    for ms in [0, 0, 1200, 2400, 3600, 0] {
        feed(&mut detector, &control, &store, &schema, ms, 0).await;
    }

    let board = store.load_leaderboard("lot-b").unwrap();
    assert_eq!(board.len(), 1);
    assert!((board[0].lap_time - 3.6).abs() < 1e-4);
}

#[tokio::test]
async fn disarm_mid_run_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let schema = FrameSchema::parse(SCHEMA, "AC_packetformat.dat").unwrap();
    let store = RunStore::new(dir.path());
    let control = ControlHandle::new();
    control.arm("lot-c".into(), &store).await;

    let mut detector = RunDetector::new();
    for ms in [0, 800, 1600] {
        feed(&mut detector, &control, &store, &schema, ms, 0).await;
    }
    assert_eq!(detector.phase(), RunPhase::Recording);

    control.disarm(&store).await;
    feed(&mut detector, &control, &store, &schema, 2400, 0).await;

    assert_eq!(detector.phase(), RunPhase::Idle);
    assert!(store.load_leaderboard("lot-c").unwrap().is_empty());
    assert!(!dir.path().join("autocross").join("lot-c").exists());
}

#[tokio::test]
async fn saved_run_record_carries_samples_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let schema = FrameSchema::parse(SCHEMA, "AC_packetformat.dat").unwrap();
    let store = RunStore::new(dir.path());
    let control = ControlHandle::new();
    control.arm("lot-d".into(), &store).await;

    let mut detector = RunDetector::new();
    for ms in [0, 500, 1000, 1500, 0] {
        feed(&mut detector, &control, &store, &schema, ms, 30_000).await;
    }

    let runs_dir = dir.path().join("autocross").join("lot-d").join("runs");
    let entries: Vec<_> = std::fs::read_dir(&runs_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let run: serde_json::Value =
        serde_json::from_slice(&std::fs::read(entries[0].as_ref().unwrap().path()).unwrap())
            .unwrap();
    assert_eq!(run["courseId"], "lot-d");
    assert_eq!(run["lapTime"], 30.0);
    assert_eq!(run["carId"], "4");
    assert_eq!(run["trackId"], "12");
    assert_eq!(run["isValid"], true);
    assert_eq!(run["cones"], 0);
    // The triggering 0-frame is not buffered: three positive-timer samples.
    assert_eq!(run["telemetry"]["timestamps"].as_array().unwrap().len(), 3);
    assert_eq!(run["statistics"]["maxSpeed"], 25.0);
    // Control surface saw the save.
    let state = control.snapshot().await;
    assert!(state.armed);
    assert!(!state.run_active);
    assert!(state.run_saved_at > 0);
}
