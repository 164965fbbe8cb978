use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use typewire_server::config::ServerConfig;
use typewire_server::{build_app, spawn_rate_limit_cleanup};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "typewire_server=info,tower_http=info".into()))
        .init();

    let config = Arc::new(ServerConfig::load());
    let listen_addr = config.listen_addr.clone();
    let (app, state) = build_app(config);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%listen_addr, %err, "failed to bind listener");
            std::process::exit(1);
        },
    };
    tracing::info!(%listen_addr, "typewire-server listening");

    spawn_rate_limit_cleanup(state.clone());

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .unwrap_or_else(|err| tracing::error!(%err, "server loop exited with error"));
}

/// Waits for either ctrl-c or SIGTERM, matching the teacher's graceful
/// shutdown handling so containerized deployments get a clean stop signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate()).expect("failed to install signal handler").recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
