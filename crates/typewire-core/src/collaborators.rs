use crate::game_descriptor::{Mode, Style};
use crate::score::Score;
use crate::session::Difficulty;
use crate::word::Word;

/// External collaborator interfaces the core calls out to (source spec §6).
/// These are the system's declared out-of-scope boundary: the core only
/// ever talks to the trait, never to a concrete backing store.
pub trait DictionaryProvider: Send + Sync {
    /// Returns up to `count` items with unique labels. A provider that can't
    /// satisfy the full count returns what it has — the caller degrades
    /// gracefully rather than treating this as an error (source spec §7).
    fn generate(&self, language: &str, count: u32, style: Style, difficulty: Difficulty) -> Vec<Word>;
}

pub trait CalculusProvider: Send + Sync {
    fn generate(&self, count: u32, difficulty: Difficulty) -> Vec<Word>;
}

/// Best-effort sink for completed-round scores. Must never propagate a
/// failure into the game worker (source spec §7); implementations should
/// swallow their own errors and log.
pub trait TopScoreSink: Send + Sync {
    fn record(&self, style: Style, language: &str, difficulty: Difficulty, round_scores: &[Score], effective_words_count: u32, mode: Mode);
}
