use serde::{Deserialize, Serialize};

use crate::game::GameId;
use crate::session::Difficulty;

/// How words are presented. `Regular` shows the label verbatim; `Hidden` and
/// `Calculus` show something else (masked text, an arithmetic expression)
/// while the label remains what must be typed. The set is open-ended per the
/// source spec ("Regular|Hidden|Calculus|…"); these three are the concrete
/// styles this server implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Regular,
    Hidden,
    Calculus,
}

/// The two round-lifecycle variants (source spec §9): `Capture` is one
/// shared pool of words contested by every player; `Race` gives every
/// player their own private copy of the full generated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Capture,
    Race,
}

impl Mode {
    /// `effectiveWordsCount = mode.transform(declared, playerCount)`.
    pub fn effective_words_count(self, declared: u32, player_count: u32) -> u32 {
        match self {
            Mode::Capture => declared,
            Mode::Race => declared.saturating_mul(player_count.max(1)),
        }
    }
}

/// A game that has been created but not yet started; owned exclusively by
/// the Lobby. Promoted to a running [`crate::game::Game`] on `start-game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDescriptor {
    pub id: GameId,
    pub creator: String,
    pub style: Style,
    pub mode: Mode,
    pub rounds: u32,
    pub words_count: u32,
    pub language: String,
    pub difficulty: Difficulty,
    /// Creator first, then joiners in join order.
    pub players: Vec<String>,
}

impl GameDescriptor {
    pub fn new(
        id: GameId,
        creator: impl Into<String>,
        style: Style,
        mode: Mode,
        rounds: u32,
        words_count: u32,
        language: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        let creator = creator.into();
        Self {
            id,
            players: vec![creator.clone()],
            creator,
            style,
            mode,
            rounds,
            words_count,
            language: language.into(),
            difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_effective_count_ignores_player_count() {
        assert_eq!(Mode::Capture.effective_words_count(5, 3), 5);
    }

    #[test]
    fn race_effective_count_scales_with_players() {
        assert_eq!(Mode::Race.effective_words_count(5, 3), 15);
    }

    #[test]
    fn new_descriptor_seeds_players_with_creator() {
        let d = GameDescriptor::new(1, "alice", Style::Regular, Mode::Capture, 1, 5, "en", Difficulty::Easy);
        assert_eq!(d.players, vec!["alice".to_string()]);
    }
}
