use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use typewire_core::session::SessionHandle;
use uuid::Uuid;

use crate::error::AppError;
use crate::lobby::LobbyMsg;
use crate::state::AppState;

/// Upgrades an HTTP connection to a WebSocket, or rejects it outright if the
/// source IP is attempting connections too fast, already holds too many
/// live connections, or the server as a whole is at its configured
/// connection limit — these are the transport's only defensive checks;
/// everything past the handshake is the Lobby's problem.
pub async fn ws_handler(State(state): State<AppState>, ConnectInfo(addr): ConnectInfo<SocketAddr>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let ip = addr.ip();
    if !state.ws_rate_limiter.check_rate_limit(ip).await {
        return AppError::TooManyRequests("connection rate limit exceeded".to_string()).into_response();
    }
    if !state.try_acquire_ip_slot(ip).await {
        return AppError::TooManyRequests("per-IP connection limit reached".to_string()).into_response();
    }
    if !state.try_acquire_connection_slot() {
        state.release_ip_slot(ip).await;
        return AppError::ServiceUnavailable("connection limit reached".to_string()).into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, ip)).into_response()
}

async fn handle_socket(socket: WebSocket, state: AppState, ip: IpAddr) {
    let handle: SessionHandle = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(state.config.limits.outbound_queue_capacity);

    state.lobby.send(LobbyMsg::Register { handle, outbound: outbound_tx });

    let mut write_task = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let lobby = state.lobby.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => lobby.send(LobbyMsg::Inbound { handle, line: text.to_string() }),
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {},
            }
        }
    });

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    state.lobby.send(LobbyMsg::Disconnect { handle });
    state.release_connection_slot();
    state.release_ip_slot(ip).await;
}
