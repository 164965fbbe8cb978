use serde::Serialize;

use crate::game::GameId;
use crate::game_descriptor::{GameDescriptor, Mode, Style};
use crate::parser::ClientCommand;
use crate::score::Score;
use crate::session::SessionState;
use crate::word::Word;

/// Which [`SessionState`]s a verb may legally be received from (source spec
/// §4.1). `start-round` and `quit-game` have an additional manager/game-over
/// condition the table can't express; the router checks those itself after
/// confirming state legality here.
pub fn legal_states(command: &ClientCommand) -> &'static [SessionState] {
    use SessionState::*;
    match command {
        ClientCommand::Connect { .. } => &[Unidentified],
        ClientCommand::CreateGame { .. } => &[Identified],
        ClientCommand::DeleteGame => &[Created],
        ClientCommand::JoinGame { .. } => &[Identified],
        ClientCommand::LeaveGame => &[Joined],
        ClientCommand::StartGame => &[Created],
        ClientCommand::StartRound => &[EndRound],
        ClientCommand::ClaimWord { .. } => &[Running],
        ClientCommand::QuitGame => &[EndRound],
    }
}

pub fn is_legal(command: &ClientCommand, state: SessionState) -> bool {
    legal_states(command).contains(&state)
}

/// A pending game as shown in `games-list` (source spec §4.4): only the
/// fields the lobby view needs, covering pending games only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDescriptorView {
    pub id: GameId,
    pub creator: String,
    pub mode: Mode,
    pub style: Style,
    pub rounds: u32,
    pub words_count: u32,
    pub language: String,
    pub difficulty: crate::session::Difficulty,
    pub players: Vec<String>,
}

impl From<&GameDescriptor> for GameDescriptorView {
    fn from(d: &GameDescriptor) -> Self {
        Self {
            id: d.id,
            creator: d.creator.clone(),
            mode: d.mode,
            style: d.style,
            rounds: d.rounds,
            words_count: d.words_count,
            language: d.language.clone(),
            difficulty: d.difficulty,
            players: d.players.clone(),
        }
    }
}

/// Outbound wire messages (source spec §4.1). `type` carries the exact
/// discriminator strings the frontend contract requires.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename = "incorrect-name")]
    IncorrectName,
    #[serde(rename = "too-long-name")]
    TooLongName,
    #[serde(rename = "used-name")]
    UsedName,
    #[serde(rename = "games-list")]
    GamesList { games: Vec<GameDescriptorView> },
    #[serde(rename = "game-start")]
    GameStart { id: GameId, mode: Mode, style: Style, rounds: u32, manager: String },
    #[serde(rename = "words-list")]
    WordsList { words: Vec<Word> },
    #[serde(rename = "scores")]
    Scores {
        round_scores: Vec<Score>,
        game_scores: Vec<Score>,
        manager: String,
        round_duration: u64,
        game_over: bool,
        words: Vec<Word>,
    },
    #[serde(rename = "manager")]
    Manager { manager: String },
}

impl ServerMessage {
    /// Serializes to a single JSON object, matching the one-frame-per-message
    /// outbound contract (source spec §6).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::error!(%err, "failed to serialize outbound message");
            "{}".to_string()
        })
    }
}
