use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Mirrors the teacher's `health.rs` response shape, trimmed to what this
/// server actually tracks (no room/session-count breakdown by game, since
/// that lives inside each game worker rather than in shared state).
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_connections: usize,
    pub max_connections: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", active_connections: state.connections(), max_connections: state.config.limits.max_ws_connections })
}

pub async fn readiness_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.connections() < state.config.limits.max_ws_connections { "ready" } else { "saturated" };
    Json(HealthResponse { status, active_connections: state.connections(), max_connections: state.config.limits.max_ws_connections })
}
