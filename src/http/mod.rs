//! HTTP query and control surface
//!
//! Read side: the latest published snapshot. Control side: arm/disarm of
//! run recording plus a status poll. Handlers only touch the two
//! lock-guarded structures and the run store; they never block on the
//! ingest loop. CORS is wide open because the dashboards are served from
//! file:// and arbitrary LAN hosts.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::autocross::ControlHandle;
use crate::publisher::SnapshotPublisher;
use crate::store::RunStore;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub publisher: SnapshotPublisher,
    pub control: ControlHandle,
    pub run_store: RunStore,
}

/// Builds the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/telemetry", get(get_telemetry))
        .route("/autocross/recording/start", post(start_recording))
        .route("/autocross/recording/stop", post(stop_recording))
        .route("/autocross/recording/status", get(recording_status))
        .layer(cors)
        .with_state(state)
}

/// Binds and serves until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http server listening");
    axum::serve(listener, router(state)).await
}

async fn get_telemetry(State(state): State<AppState>) -> impl IntoResponse {
    // Stale or cleared snapshots read back as an empty body so pollers can
    // tell the stream has gone quiet.
    let body = state.publisher.latest().await.unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json")], body)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartRecordingRequest {
    course_id: String,
}

async fn start_recording(
    State(state): State<AppState>,
    Json(request): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    state.control.arm(request.course_id, &state.run_store).await;
    Json(json!({ "success": true }))
}

async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    state.control.disarm(&state.run_store).await;
    Json(json!({ "success": true }))
}

async fn recording_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.control.snapshot().await)
}
