use crate::game::GameId;
use crate::game_descriptor::{Mode, Style};
use crate::session::Difficulty;

/// A tokenized inbound frame, before verb-specific argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub verb: String,
    pub args: Vec<String>,
}

/// Splits an inbound text frame into a verb and its space-separated
/// arguments. Repeated separators and leading/trailing whitespace are
/// tolerated (`split_whitespace` semantics); an empty or all-whitespace
/// frame tokenizes to nothing, which the caller treats as an illegal verb.
pub fn tokenize(line: &str) -> Option<RawCommand> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next()?.to_string();
    let args = tokens.map(str::to_string).collect();
    Some(RawCommand { verb, args })
}

/// A fully parsed, typed inbound command (source spec §4.1). Produced from a
/// [`RawCommand`] by [`parse_command`]; a `None` result is an argument
/// parsing error and is treated as illegal (silently ignored, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Connect { name: String },
    CreateGame { mode: Mode, style: Style, rounds: u32, words_count: u32, language: String, difficulty: Difficulty },
    DeleteGame,
    JoinGame { id: GameId },
    LeaveGame,
    StartGame,
    StartRound,
    ClaimWord { label: String },
    QuitGame,
}

impl ClientCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            ClientCommand::Connect { .. } => "connect",
            ClientCommand::CreateGame { .. } => "create-game",
            ClientCommand::DeleteGame => "delete-game",
            ClientCommand::JoinGame { .. } => "join-game",
            ClientCommand::LeaveGame => "leave-game",
            ClientCommand::StartGame => "start-game",
            ClientCommand::StartRound => "start-round",
            ClientCommand::ClaimWord { .. } => "claim-word",
            ClientCommand::QuitGame => "quit-game",
        }
    }
}

fn parse_mode(s: &str) -> Option<Mode> {
    match s {
        "capture" => Some(Mode::Capture),
        "race" => Some(Mode::Race),
        _ => None,
    }
}

fn parse_style(s: &str) -> Option<Style> {
    match s {
        "regular" => Some(Style::Regular),
        "hidden" => Some(Style::Hidden),
        "calculus" => Some(Style::Calculus),
        _ => None,
    }
}

fn parse_difficulty(s: &str) -> Option<Difficulty> {
    match s {
        "easy" => Some(Difficulty::Easy),
        "normal" => Some(Difficulty::Normal),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

/// Parses a tokenized line into a typed command for a recognized verb.
/// Returns `None` for an unrecognized verb or malformed arguments — both
/// are "illegal" per source spec §4.1 and are handled identically by the
/// router (ignored, no reply).
pub fn parse_command(raw: &RawCommand) -> Option<ClientCommand> {
    match raw.verb.as_str() {
        "connect" => {
            let [name] = raw.args.as_slice() else { return None };
            Some(ClientCommand::Connect { name: name.clone() })
        },
        "create-game" => {
            let [mode, style, rounds, words_count, language, difficulty] = raw.args.as_slice() else {
                return None;
            };
            Some(ClientCommand::CreateGame {
                mode: parse_mode(mode)?,
                style: parse_style(style)?,
                rounds: rounds.parse().ok()?,
                words_count: words_count.parse().ok()?,
                language: language.clone(),
                difficulty: parse_difficulty(difficulty)?,
            })
        },
        "delete-game" => raw.args.is_empty().then_some(ClientCommand::DeleteGame),
        "join-game" => {
            let [id] = raw.args.as_slice() else { return None };
            Some(ClientCommand::JoinGame { id: id.parse().ok()? })
        },
        "leave-game" => raw.args.is_empty().then_some(ClientCommand::LeaveGame),
        "start-game" => raw.args.is_empty().then_some(ClientCommand::StartGame),
        "start-round" => raw.args.is_empty().then_some(ClientCommand::StartRound),
        "claim-word" => {
            let [label] = raw.args.as_slice() else { return None };
            Some(ClientCommand::ClaimWord { label: label.clone() })
        },
        "quit-game" => raw.args.is_empty().then_some(ClientCommand::QuitGame),
        _ => None,
    }
}

/// Convenience wrapper combining [`tokenize`] and [`parse_command`].
pub fn parse_line(line: &str) -> Option<ClientCommand> {
    let raw = tokenize(line)?;
    parse_command(&raw)
}
