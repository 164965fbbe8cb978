use serde::{Deserialize, Serialize};

/// A single claimable item in a round. `label` is what the player must type
/// to claim it; `display` is what is shown and may differ (hidden/calculus
/// styles show something other than the literal label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub label: String,
    pub display: String,
    pub claimed_by: Option<String>,
}

impl Word {
    pub fn new(label: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            display: display.into(),
            claimed_by: None,
        }
    }

    /// The wire-safe form of this word: `label` blanked out until claimed, so
    /// an unclaimed Hidden/Calculus word can't be solved by reading the raw
    /// `words-list` payload instead of the puzzle.
    pub fn for_wire(&self) -> Self {
        Self {
            label: if self.claimed_by.is_some() { self.label.clone() } else { String::new() },
            display: self.display.clone(),
            claimed_by: self.claimed_by.clone(),
        }
    }
}
