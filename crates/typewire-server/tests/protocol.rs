use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use typewire_server::build_app;
use typewire_server::config::{ExpirationConfig, LimitsConfig, ServerConfig};

type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn fast_config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        max_display_name_len: 16,
        countdown_secs: 1,
        expiration: ExpirationConfig { base_secs: 1.0, per_word_secs: 0.0, hidden_multiplier: 1.0, calculus_multiplier: 1.0 },
        limits: LimitsConfig { max_ws_connections: 50, max_ws_per_ip: 50, outbound_queue_capacity: 64, ws_rate_limit_per_sec: 50.0 },
    }
}

async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (app, _state) = build_app(Arc::new(config));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> TestSocket {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    ws
}

async fn send(ws: &mut TestSocket, line: &str) {
    ws.send(Message::Text(line.into())).await.expect("send");
}

async fn recv(ws: &mut TestSocket) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(3), ws.next())
        .await
        .expect("timed out waiting for message")
        .expect("stream ended")
        .expect("ws error");
    serde_json::from_str(msg.to_text().unwrap()).unwrap()
}

#[tokio::test]
async fn duplicate_name_is_rejected_then_retry_succeeds() {
    let addr = spawn_server(fast_config()).await;
    let mut alice = connect(addr).await;
    send(&mut alice, "connect alice").await;
    assert_eq!(recv(&mut alice).await["type"], "games-list");

    let mut second = connect(addr).await;
    send(&mut second, "connect alice").await;
    assert_eq!(recv(&mut second).await["type"], "used-name");

    send(&mut second, "connect bob").await;
    assert_eq!(recv(&mut second).await["type"], "games-list");
}

#[tokio::test]
async fn malformed_name_is_rejected() {
    let addr = spawn_server(fast_config()).await;
    let mut conn = connect(addr).await;
    send(&mut conn, "connect has space").await; // tokenizes into extra args -> illegal, ignored.
    send(&mut conn, "connect").await; // zero args -> illegal, ignored.
    send(&mut conn, &format!("connect {}", "x".repeat(32))).await;
    assert_eq!(recv(&mut conn).await["type"], "too-long-name");
}

#[tokio::test]
async fn create_join_start_and_claim_words_to_completion() {
    let addr = spawn_server(fast_config()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, "connect alice").await;
    recv(&mut alice).await;
    send(&mut bob, "connect bob").await;
    recv(&mut bob).await;

    send(&mut alice, "create-game capture regular 1 2 en easy").await;
    let games_list = recv(&mut alice).await;
    assert_eq!(games_list["type"], "games-list");
    let game_id = games_list["games"][0]["id"].as_u64().unwrap();

    send(&mut bob, &format!("join-game {game_id}")).await;
    recv(&mut bob).await; // games-list reflecting bob joining
    recv(&mut alice).await; // same broadcast to alice

    send(&mut alice, "start-game").await;
    let start_alice = recv(&mut alice).await;
    let start_bob = recv(&mut bob).await;
    assert_eq!(start_alice["type"], "game-start");
    assert_eq!(start_bob["type"], "game-start");

    // Countdown elapses (~1s), words-list arrives for both.
    let words_alice = recv(&mut alice).await;
    assert_eq!(words_alice["type"], "words-list");
    let words = words_alice["words"].as_array().unwrap();
    assert_eq!(words.len(), 2);
    recv(&mut bob).await;

    // Regular style: display is the literal word, so it's what a real client
    // reads to know what to type. (label itself is wire-redacted until claimed.)
    let first_label = words[0]["display"].as_str().unwrap();
    let second_label = words[1]["display"].as_str().unwrap();

    send(&mut alice, &format!("claim-word {first_label}")).await;
    // Capture mode: both players see the updated shared pool.
    let update_alice = recv(&mut alice).await;
    assert_eq!(update_alice["type"], "words-list");
    recv(&mut bob).await;

    send(&mut bob, &format!("claim-word {second_label}")).await;
    let scores_alice = recv(&mut alice).await;
    assert_eq!(scores_alice["type"], "scores");
    assert!(scores_alice["gameOver"].as_bool().unwrap());
    let round_scores = scores_alice["roundScores"].as_array().unwrap();
    assert_eq!(round_scores.len(), 2);
}

#[tokio::test]
async fn claim_word_is_silently_ignored_before_running() {
    let addr = spawn_server(fast_config()).await;
    let mut alice = connect(addr).await;
    send(&mut alice, "connect alice").await;
    recv(&mut alice).await;

    // Not yet in any game; claim-word is illegal from Identified and must
    // produce no reply. We confirm by following it with a legal command and
    // checking that reply arrives next, rather than an unrelated one.
    send(&mut alice, "claim-word cat").await;
    send(&mut alice, "create-game capture regular 1 1 en easy").await;
    let reply = recv(&mut alice).await;
    assert_eq!(reply["type"], "games-list");
}
