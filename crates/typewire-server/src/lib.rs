pub mod broadcast;
pub mod collaborators;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod game_worker;
pub mod health;
pub mod lobby;
pub mod rate_limit;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::state::AppState;

/// Builds the full router: `/health`, `/ready`, `/ws`. Split out from
/// `main` so integration tests can bind it to an ephemeral port without
/// going through the binary's startup/shutdown wiring.
pub fn build_app(config: Arc<ServerConfig>) -> (Router, AppState) {
    let clock = Arc::new(typewire_core::time::SystemClock);
    let collaborators = Arc::new(Collaborators::defaults(clock));
    let shutdown = CancellationToken::new();
    let lobby = lobby::spawn_lobby(config.clone(), collaborators);
    let state = AppState::new(config, lobby, shutdown);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/ws", get(ws::ws_handler))
        .with_state(state.clone())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(axum::http::header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")))
        .layer(SetResponseHeaderLayer::overriding(axum::http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")));

    (router, state)
}

/// Background task that periodically evicts stale rate-limiter buckets so
/// long-lived deployments don't accumulate one entry per address forever.
pub fn spawn_rate_limit_cleanup(state: AppState) {
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    state.ws_rate_limiter.cleanup(std::time::Duration::from_secs(300)).await;
                }
            }
        }
    });
}
