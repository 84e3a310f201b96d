//! Trackside server binary: schema load, game dispatch, UDP ingest and the
//! HTTP query/control surface.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use trackside::autocross::ControlHandle;
use trackside::games::{self, GameContext};
use trackside::http::{self, AppState};
use trackside::publisher::SnapshotPublisher;
use trackside::schema::FrameSchema;
use trackside::store::{OdometerStore, RunStore, SplitStore};
use trackside::ingest;
use trackside::timing::SplitMode;

#[derive(Debug, Parser)]
#[command(name = "trackside", version, about = "Live telemetry decoder for racing simulators")]
struct Args {
    /// Abbreviated game id, e.g. FM, FM7, FH5, FH4, DR2, AC
    #[arg(long, default_value = "FM")]
    game: String,

    /// UDP port the game streams telemetry to
    #[arg(long, default_value_t = 9999)]
    port: u16,

    /// Port for the JSON query/control surface
    #[arg(long, default_value_t = 8888)]
    http_port: u16,

    /// Baseline for the live split delta: car, class or session
    #[arg(long, default_value = "car")]
    split: SplitMode,

    /// Directory holding <GAME>_packetformat.dat schema files
    #[arg(long, default_value = "packets")]
    schema_dir: PathBuf,

    /// Directory for persisted splits, odometers and runs
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Disable the HTTP surface
    #[arg(long)]
    no_http: bool,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "trackside=debug" } else { "trackside=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    // An unreadable or malformed schema is fatal before any frame flows.
    let schema_path = args.schema_dir.join(format!("{}_packetformat.dat", args.game));
    let schema = FrameSchema::load(&schema_path)
        .with_context(|| format!("cannot start without schema {}", schema_path.display()))?;

    let publisher = SnapshotPublisher::new();
    let control = ControlHandle::new();
    let split_store = SplitStore::new(&args.data_dir);
    let odometer_store = OdometerStore::new(&args.data_dir);
    let run_store = RunStore::new(&args.data_dir);

    // Restore an in-progress arm across restarts.
    control.restore(&run_store).await;

    if !args.no_http {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.http_port));
        let state = AppState {
            publisher: publisher.clone(),
            control: control.clone(),
            run_store: run_store.clone(),
        };
        tokio::spawn(async move {
            if let Err(err) = http::serve(addr, state).await {
                error!(error = %err, "http server exited");
            }
        });
    }

    let game = games::select(&args.game);
    info!(
        game = %game.title(),
        udp_port = args.port,
        split = args.split.as_str(),
        "starting telemetry ingest"
    );

    let socket = ingest::bind(args.port).await?;
    let ctx = GameContext {
        schema,
        split_mode: args.split,
        publisher,
        control,
        split_store,
        odometer_store,
        run_store,
    };

    game.run(socket, ctx).await.context("telemetry ingest loop failed")
}
