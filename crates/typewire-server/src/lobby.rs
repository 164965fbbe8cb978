use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use typewire_core::game::{Game, GameId, Seat};
use typewire_core::game_descriptor::GameDescriptor;
use typewire_core::parser::{self, ClientCommand};
use typewire_core::protocol::{self, GameDescriptorView, ServerMessage};
use typewire_core::session::{NameAcceptance, SessionHandle, SessionState, validate_name};

use crate::broadcast::{self, OutboundMap, OutboundSender, OverflowPolicy};
use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::game_worker::{self, GameCommand, GameWorkerHandle};

/// Everything a connection task sends the Lobby, plus the events a game
/// worker reports back on the same channel — a single mpsc queue gives the
/// Lobby's mutable state (session registry, pending games, running-game
/// table) exactly one writer, matching the teacher's `RoomManager` actor
/// shape (source spec §5's "one logical worker for the Lobby").
pub enum LobbyMsg {
    Register { handle: SessionHandle, outbound: OutboundSender },
    Inbound { handle: SessionHandle, line: String },
    Disconnect { handle: SessionHandle },
    GameSetStates { handles: Vec<SessionHandle>, state: SessionState },
    GamePlayerReturned { handle: SessionHandle },
    GameDestroyed { game_id: GameId },
}

#[derive(Clone)]
pub struct LobbyHandle {
    tx: mpsc::UnboundedSender<LobbyMsg>,
}

impl LobbyHandle {
    pub fn send(&self, msg: LobbyMsg) {
        let _ = self.tx.send(msg);
    }
}

pub fn spawn_lobby(config: Arc<ServerConfig>, collaborators: Arc<Collaborators>) -> LobbyHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = LobbyHandle { tx: tx.clone() };
    tokio::spawn(run_lobby(rx, tx, config, collaborators));
    handle
}

struct SessionEntry {
    display_name: String,
    state: SessionState,
    game_id: Option<GameId>,
}

async fn run_lobby(mut rx: mpsc::UnboundedReceiver<LobbyMsg>, self_tx: mpsc::UnboundedSender<LobbyMsg>, config: Arc<ServerConfig>, collaborators: Arc<Collaborators>) {
    let mut sessions: HashMap<SessionHandle, SessionEntry> = HashMap::new();
    let mut outbound: OutboundMap = HashMap::new();
    let mut pending: HashMap<GameId, GameDescriptor> = HashMap::new();
    let mut running: HashMap<GameId, GameWorkerHandle> = HashMap::new();
    let mut next_game_id: GameId = 1;

    while let Some(msg) = rx.recv().await {
        match msg {
            LobbyMsg::Register { handle, outbound: sender } => {
                sessions.insert(handle, SessionEntry { display_name: String::new(), state: SessionState::Unidentified, game_id: None });
                outbound.insert(handle, sender);
            },

            LobbyMsg::Disconnect { handle } => {
                let Some(entry) = sessions.remove(&handle) else { continue };
                outbound.remove(&handle);
                if let Some(game_id) = entry.game_id {
                    if let Some(worker) = running.get(&game_id) {
                        let _ = worker.tx.send(GameCommand::Disconnect { handle });
                    } else if let Some(descriptor) = pending.get_mut(&game_id) {
                        descriptor.players.retain(|p| p != &entry.display_name);
                        if descriptor.creator == entry.display_name {
                            pending.remove(&game_id);
                            reassign_orphans(&mut sessions, game_id);
                        }
                        broadcast_games_list(&sessions, &outbound, &pending);
                    }
                }
            },

            LobbyMsg::Inbound { handle, line } => {
                handle_inbound(
                    handle,
                    &line,
                    &mut sessions,
                    &mut outbound,
                    &mut pending,
                    &mut running,
                    &mut next_game_id,
                    &config,
                    &collaborators,
                    &self_tx,
                );
            },

            LobbyMsg::GameSetStates { handles, state } => {
                for handle in handles {
                    if let Some(entry) = sessions.get_mut(&handle) {
                        entry.state = state;
                    }
                }
            },

            LobbyMsg::GamePlayerReturned { handle } => {
                if let Some(entry) = sessions.get_mut(&handle) {
                    entry.state = SessionState::Identified;
                    entry.game_id = None;
                }
                broadcast_games_list(&sessions, &outbound, &pending);
            },

            LobbyMsg::GameDestroyed { game_id } => {
                running.remove(&game_id);
                broadcast_games_list(&sessions, &outbound, &pending);
            },
        }
    }
}

/// When a pending game's creator disconnects, every joiner falls back to
/// `Identified` rather than being left pointing at a descriptor that no
/// longer exists.
fn reassign_orphans(sessions: &mut HashMap<SessionHandle, SessionEntry>, game_id: GameId) {
    for entry in sessions.values_mut() {
        if entry.game_id == Some(game_id) {
            entry.state = SessionState::Identified;
            entry.game_id = None;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_inbound(
    handle: SessionHandle,
    line: &str,
    sessions: &mut HashMap<SessionHandle, SessionEntry>,
    outbound: &mut OutboundMap,
    pending: &mut HashMap<GameId, GameDescriptor>,
    running: &mut HashMap<GameId, GameWorkerHandle>,
    next_game_id: &mut GameId,
    config: &Arc<ServerConfig>,
    collaborators: &Arc<Collaborators>,
    self_tx: &mpsc::UnboundedSender<LobbyMsg>,
) {
    let Some(entry) = sessions.get(&handle) else { return };
    let current_state = entry.state;

    let Some(command) = parser::parse_line(line) else {
        return; // unrecognized verb or malformed args: illegal, ignored (source spec §7).
    };

    if !protocol::is_legal(&command, current_state) {
        return;
    }

    match command {
        ClientCommand::Connect { name } => {
            let taken = sessions.values().any(|s| s.display_name == name);
            match validate_name(&name, config.max_display_name_len, |_| taken) {
                NameAcceptance::TooLong => {
                    broadcast::send_one(outbound, handle, &ServerMessage::TooLongName);
                },
                NameAcceptance::Incorrect => {
                    broadcast::send_one(outbound, handle, &ServerMessage::IncorrectName);
                },
                NameAcceptance::Used => {
                    broadcast::send_one(outbound, handle, &ServerMessage::UsedName);
                },
                NameAcceptance::Accepted => {
                    if let Some(entry) = sessions.get_mut(&handle) {
                        entry.display_name = name;
                        entry.state = SessionState::Identified;
                    }
                    broadcast::send_one(outbound, handle, &ServerMessage::GamesList { games: pending_views(pending) });
                },
            }
        },

        ClientCommand::CreateGame { mode, style, rounds, words_count, language, difficulty } => {
            let creator = entry_name(sessions, handle);
            let id = *next_game_id;
            *next_game_id += 1;
            pending.insert(id, GameDescriptor::new(id, creator, style, mode, rounds, words_count, language, difficulty));
            if let Some(entry) = sessions.get_mut(&handle) {
                entry.state = SessionState::Created;
                entry.game_id = Some(id);
            }
            broadcast_games_list(sessions, outbound, pending);
        },

        ClientCommand::DeleteGame => {
            let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id) else { return };
            pending.remove(&game_id);
            reassign_orphans(sessions, game_id);
            if let Some(entry) = sessions.get_mut(&handle) {
                entry.state = SessionState::Identified;
                entry.game_id = None;
            }
            broadcast_games_list(sessions, outbound, pending);
        },

        ClientCommand::JoinGame { id } => {
            let Some(descriptor) = pending.get_mut(&id) else { return };
            let name = entry_name(sessions, handle);
            descriptor.players.push(name);
            if let Some(entry) = sessions.get_mut(&handle) {
                entry.state = SessionState::Joined;
                entry.game_id = Some(id);
            }
            broadcast_games_list(sessions, outbound, pending);
        },

        ClientCommand::LeaveGame => {
            let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id) else { return };
            let name = entry_name(sessions, handle);
            if let Some(descriptor) = pending.get_mut(&game_id) {
                descriptor.players.retain(|p| p != &name);
            }
            if let Some(entry) = sessions.get_mut(&handle) {
                entry.state = SessionState::Identified;
                entry.game_id = None;
            }
            broadcast_games_list(sessions, outbound, pending);
        },

        ClientCommand::StartGame => {
            let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id) else { return };
            let Some(descriptor) = pending.remove(&game_id) else { return };

            let seats: Vec<Seat> = descriptor
                .players
                .iter()
                .filter_map(|name| sessions.iter().find(|(_, e)| &e.display_name == name).map(|(h, _)| Seat { handle: *h, display_name: name.clone() }))
                .collect();
            let mut seat_outbound: OutboundMap = seats.iter().filter_map(|s| outbound.get(&s.handle).map(|tx| (s.handle, tx.clone()))).collect();

            let mut game = Game::start(descriptor, seats);
            game.start_countdown();
            let start_message = ServerMessage::GameStart { id: game.id, mode: game.mode, style: game.style, rounds: game.rounds, manager: game.manager.clone() };
            let failed = broadcast::broadcast(outbound, game.seats.iter().map(|s| s.handle), &start_message, OverflowPolicy::Disconnect);
            for handle in failed {
                seat_outbound.remove(&handle);
            }

            for seat in &game.seats {
                if let Some(entry) = sessions.get_mut(&seat.handle) {
                    entry.state = SessionState::Started;
                    entry.game_id = Some(game_id);
                }
            }

            let deadline = Instant::now() + Duration::from_secs(config.countdown_secs);
            let worker = game_worker::spawn_game_worker(game, seat_outbound, deadline, self_tx.clone(), collaborators.clone(), config.clone());
            running.insert(game_id, worker);

            broadcast_games_list(sessions, outbound, pending);
        },

        ClientCommand::StartRound => {
            if let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id)
                && let Some(worker) = running.get(&game_id)
            {
                let _ = worker.tx.send(GameCommand::StartRound { display_name: entry_name(sessions, handle) });
            }
        },

        ClientCommand::ClaimWord { label } => {
            if let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id)
                && let Some(worker) = running.get(&game_id)
            {
                let _ = worker.tx.send(GameCommand::ClaimWord { display_name: entry_name(sessions, handle), label });
            }
        },

        ClientCommand::QuitGame => {
            if let Some(game_id) = sessions.get(&handle).and_then(|e| e.game_id)
                && let Some(worker) = running.get(&game_id)
            {
                let _ = worker.tx.send(GameCommand::QuitGame { handle });
            }
        },
    }
}

fn entry_name(sessions: &HashMap<SessionHandle, SessionEntry>, handle: SessionHandle) -> String {
    sessions.get(&handle).map(|e| e.display_name.clone()).unwrap_or_default()
}

fn pending_views(pending: &HashMap<GameId, GameDescriptor>) -> Vec<GameDescriptorView> {
    let mut views: Vec<GameDescriptorView> = pending.values().map(GameDescriptorView::from).collect();
    views.sort_by_key(|v| v.id);
    views
}

/// Sends a fresh `games-list` to every session currently in the lobby proper
/// (not mid-game) — the only sessions that can act on it.
fn broadcast_games_list(sessions: &HashMap<SessionHandle, SessionEntry>, outbound: &OutboundMap, pending: &HashMap<GameId, GameDescriptor>) {
    let views = pending_views(pending);
    let targets = sessions
        .iter()
        .filter(|(_, e)| matches!(e.state, SessionState::Identified | SessionState::Created | SessionState::Joined))
        .map(|(h, _)| *h);
    broadcast::broadcast(outbound, targets, &ServerMessage::GamesList { games: views }, OverflowPolicy::DropMessage);
}
