use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::sleep_until;
use typewire_core::game::{ClaimOutcome, Game};
use typewire_core::game_descriptor::{Mode, Style};
use typewire_core::protocol::ServerMessage;
use typewire_core::session::{SessionHandle, SessionState};

use crate::broadcast::{self, OutboundMap, OverflowPolicy};
use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::lobby::LobbyMsg;

/// Commands routed to a specific running game's worker. The Lobby has
/// already checked FSM legality by the time one of these arrives; the
/// worker only enforces the preconditions the legality table can't express
/// (manager-only `start-round`).
pub enum GameCommand {
    StartRound { display_name: String },
    ClaimWord { display_name: String, label: String },
    QuitGame { handle: SessionHandle },
    Disconnect { handle: SessionHandle },
}

#[derive(Clone)]
pub struct GameWorkerHandle {
    pub tx: mpsc::UnboundedSender<GameCommand>,
}

/// One tokio task per running game (source spec §5): it owns `Game`
/// exclusively for the game's lifetime, so every mutation below is a plain
/// synchronous call with no locking. The single `sleep_until` in the
/// `select!` is the only scheduled timer this worker ever has at once —
/// replacing it whenever the round advances is what keeps a stale
/// countdown from ever firing `start_play` against a round that already
/// moved on, standing in for the epoch-guard comparison the core's
/// `round_epoch` counter exists to support.
pub fn spawn_game_worker(
    game: Game,
    outbound: OutboundMap,
    first_deadline: Instant,
    lobby_tx: mpsc::UnboundedSender<LobbyMsg>,
    collaborators: std::sync::Arc<Collaborators>,
    config: std::sync::Arc<ServerConfig>,
) -> GameWorkerHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_game_worker(game, outbound, first_deadline, rx, lobby_tx, collaborators, config));
    GameWorkerHandle { tx }
}

enum Phase {
    Countdown(Instant),
    Playing(Instant),
    /// Between rounds: waiting for `start-round` or `quit-game`, no timer.
    AwaitingNextRound,
}

async fn run_game_worker(
    mut game: Game,
    mut outbound: OutboundMap,
    first_deadline: Instant,
    mut cmd_rx: mpsc::UnboundedReceiver<GameCommand>,
    lobby_tx: mpsc::UnboundedSender<LobbyMsg>,
    collaborators: std::sync::Arc<Collaborators>,
    config: std::sync::Arc<ServerConfig>,
) {
    let mut phase = Phase::Countdown(first_deadline);

    loop {
        let timer_deadline = match &phase {
            Phase::Countdown(d) | Phase::Playing(d) => Some(*d),
            Phase::AwaitingNextRound => None,
        };

        let fired = match timer_deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = sleep_until(deadline) => true,
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { return };
                        if !handle_command(cmd, &mut game, &mut outbound, &lobby_tx, &collaborators, &config, &mut phase).await {
                            return;
                        }
                        false
                    }
                }
            },
            None => {
                let Some(cmd) = cmd_rx.recv().await else { return };
                if !handle_command(cmd, &mut game, &mut outbound, &lobby_tx, &collaborators, &config, &mut phase).await {
                    return;
                }
                false
            },
        };

        if fired {
            match phase {
                Phase::Countdown(_) => {
                    let deadline = enter_play(&mut game, &mut outbound, &collaborators, &config).await;
                    notify_states(&lobby_tx, seat_handles(&game), SessionState::Running);
                    phase = Phase::Playing(deadline);
                },
                Phase::Playing(_) => {
                    if finish_round(&mut game, &mut outbound, &collaborators, &lobby_tx).await {
                        return;
                    }
                    phase = Phase::AwaitingNextRound;
                },
                Phase::AwaitingNextRound => unreachable!("no timer is armed while awaiting the next round"),
            }
        }
    }
}

fn seat_handles(game: &Game) -> Vec<SessionHandle> {
    game.seats.iter().map(|s| s.handle).collect()
}

fn notify_states(lobby_tx: &mpsc::UnboundedSender<LobbyMsg>, handles: Vec<SessionHandle>, state: SessionState) {
    let _ = lobby_tx.send(LobbyMsg::GameSetStates { handles, state });
}

/// Broadcasts a must-arrive message (`scores`, `game-start`, `manager`) under
/// [`OverflowPolicy::Disconnect`], removing any seat that's too backed up to
/// receive it and handling the fallout — manager reassignment can itself
/// need to be re-broadcast, and cascade into destroying the game. Returns
/// `true` once the game is destroyed, at which point the caller must stop
/// touching `game` and exit the worker.
fn broadcast_must_arrive(game: &mut Game, outbound: &mut OutboundMap, lobby_tx: &mpsc::UnboundedSender<LobbyMsg>, message: &ServerMessage) -> bool {
    let failed = broadcast::broadcast(outbound, seat_handles(game), message, OverflowPolicy::Disconnect);
    for handle in failed {
        outbound.remove(&handle);
        let outcome = game.remove_player(handle);
        if outcome.game_destroyed {
            let _ = lobby_tx.send(LobbyMsg::GameDestroyed { game_id: game.id });
            return true;
        }
        if let Some(manager) = outcome.new_manager {
            let manager_msg = ServerMessage::Manager { manager };
            if broadcast_must_arrive(game, outbound, lobby_tx, &manager_msg) {
                return true;
            }
        }
    }
    false
}

/// Sends the current `words-list` snapshot to every seat. In `Capture` mode
/// every seat contests the same pool, so one broadcast covers all of them;
/// in `Race` mode each seat has its own private list and must be sent
/// individually, or players would see each other's progress.
fn broadcast_words_list(game: &Game, outbound: &mut OutboundMap) {
    let Some(assignments) = game.word_assignments.as_ref() else { return };
    match game.mode {
        Mode::Capture => {
            let words = assignments.view(None);
            let failed = broadcast::broadcast(outbound, seat_handles(game), &ServerMessage::WordsList { words }, OverflowPolicy::DropMessage);
            for handle in failed {
                outbound.remove(&handle);
            }
        },
        Mode::Race => {
            for seat in &game.seats {
                let words = assignments.view(Some(&seat.display_name));
                broadcast::broadcast(outbound, [seat.handle], &ServerMessage::WordsList { words }, OverflowPolicy::DropMessage);
            }
        },
    }
}

/// Generates this round's words via the style-appropriate collaborator,
/// starts play, and broadcasts `words-list`. Returns the deadline for
/// `claim_remaining_words`.
async fn enter_play(game: &mut Game, outbound: &mut OutboundMap, collaborators: &Collaborators, config: &ServerConfig) -> Instant {
    let count = game.mode.effective_words_count(game.declared_words_count, game.player_count());
    let words = match game.style {
        Style::Calculus => collaborators.calculus.generate(count, game.difficulty),
        _ => collaborators.dictionary.generate(&game.language, count, game.style, game.difficulty),
    };
    let now = collaborators.clock.now_millis();
    game.start_play(words, now);

    broadcast_words_list(game, outbound);

    let expiration = config.expiration.duration_for(game.style, game.declared_words_count);
    Instant::now() + expiration
}

/// `claimRemainingWords` / natural round completion: scores, advances the
/// epoch, and either re-arms for the next round or ends the game.
async fn finish_round(game: &mut Game, outbound: &mut OutboundMap, collaborators: &Collaborators, lobby_tx: &mpsc::UnboundedSender<LobbyMsg>) -> bool {
    let now = collaborators.clock.now_millis();
    let result = game.end_round(now);

    collaborators.top_scores.record(game.style, &game.language, game.difficulty, &result.round_scores, game.effective_words_count, game.mode);

    let message = ServerMessage::Scores {
        round_scores: result.round_scores,
        game_scores: result.game_scores,
        manager: result.manager,
        round_duration: (now - game.round_start_millis).max(0) as u64,
        game_over: result.game_over,
        words: result.words,
    };
    if broadcast_must_arrive(game, outbound, lobby_tx, &message) {
        return true;
    }

    notify_states(lobby_tx, seat_handles(game), SessionState::EndRound);
    false
}

/// Handles one inbound command. Returns `false` when the game has just been
/// destroyed and the worker should exit.
async fn handle_command(
    cmd: GameCommand,
    game: &mut Game,
    outbound: &mut OutboundMap,
    lobby_tx: &mpsc::UnboundedSender<LobbyMsg>,
    collaborators: &Collaborators,
    config: &ServerConfig,
    phase: &mut Phase,
) -> bool {
    match cmd {
        GameCommand::StartRound { display_name } => {
            if !matches!(phase, Phase::AwaitingNextRound) || !game.is_manager(&display_name) {
                return true;
            }
            game.start_countdown();
            let message = ServerMessage::GameStart { id: game.id, mode: game.mode, style: game.style, rounds: game.rounds, manager: game.manager.clone() };
            if broadcast_must_arrive(game, outbound, lobby_tx, &message) {
                return false;
            }
            notify_states(lobby_tx, seat_handles(game), SessionState::Started);
            *phase = Phase::Countdown(Instant::now() + std::time::Duration::from_secs(config.countdown_secs));
            true
        },
        GameCommand::ClaimWord { display_name, label } => {
            if !matches!(phase, Phase::Playing(_)) {
                return true;
            }
            match game.claim_word(&display_name, &label) {
                ClaimOutcome::Accepted { round_complete } => {
                    if round_complete {
                        let destroyed = finish_round(game, outbound, collaborators, lobby_tx).await;
                        if destroyed {
                            return false;
                        }
                        *phase = Phase::AwaitingNextRound;
                        return true;
                    }
                    broadcast_words_list(game, outbound);
                    true
                },
                ClaimOutcome::Rejected => true,
            }
        },
        GameCommand::QuitGame { handle } => {
            if !matches!(phase, Phase::AwaitingNextRound) {
                return true;
            }
            let outcome = game.remove_player(handle);
            outbound.remove(&handle);
            let _ = lobby_tx.send(LobbyMsg::GamePlayerReturned { handle });
            if outcome.game_destroyed {
                let _ = lobby_tx.send(LobbyMsg::GameDestroyed { game_id: game.id });
                return false;
            }
            if let Some(manager) = outcome.new_manager {
                if broadcast_must_arrive(game, outbound, lobby_tx, &ServerMessage::Manager { manager }) {
                    return false;
                }
            }
            true
        },
        GameCommand::Disconnect { handle } => {
            let outcome = game.remove_player(handle);
            outbound.remove(&handle);
            if outcome.game_destroyed {
                let _ = lobby_tx.send(LobbyMsg::GameDestroyed { game_id: game.id });
                return false;
            }
            if let Some(manager) = outcome.new_manager {
                if broadcast_must_arrive(game, outbound, lobby_tx, &ServerMessage::Manager { manager }) {
                    return false;
                }
            }
            true
        },
    }
}
