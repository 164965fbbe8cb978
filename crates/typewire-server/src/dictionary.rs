use std::sync::LazyLock;

use rand::Rng;
use rand::seq::IndexedRandom;
use typewire_core::collaborators::{CalculusProvider, DictionaryProvider, TopScoreSink};
use typewire_core::game_descriptor::{Mode, Style};
use typewire_core::score::Score;
use typewire_core::session::Difficulty;
use typewire_core::word::Word;

static WORDS: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| include_str!("../assets/dictionary.txt").lines().map(str::trim).filter(|l| !l.is_empty()).collect());

/// Default [`DictionaryProvider`], grounded in the embedded-wordlist pattern
/// (an `include_str!`'d asset loaded once behind a lazily-initialized
/// static). The source list has a few hundred entries; language/difficulty
/// don't currently partition it (there is only one embedded language), so
/// both parameters are accepted but only `style` changes the output shape.
#[derive(Debug, Default)]
pub struct StaticDictionaryProvider;

impl DictionaryProvider for StaticDictionaryProvider {
    fn generate(&self, _language: &str, count: u32, style: Style, _difficulty: Difficulty) -> Vec<Word> {
        let mut rng = rand::rng();
        let count = count as usize;
        let pool = &*WORDS;
        let mut labels = Vec::with_capacity(count);
        if count <= pool.len() {
            labels.extend(pool.choose_multiple(&mut rng, count).map(|s| s.to_string()));
        } else {
            // Degrade gracefully rather than erroring: exhaust the pool once
            // (without replacement, so the first pool.len() labels stay
            // unique) then reuse words with a numeric suffix for the rest.
            labels.extend(pool.choose_multiple(&mut rng, pool.len()).map(|s| s.to_string()));
            for i in pool.len()..count {
                let base = pool.choose(&mut rng).copied().unwrap_or("word");
                labels.push(format!("{base}-{i}"));
            }
        }

        labels
            .into_iter()
            .map(|label| {
                let display = match style {
                    Style::Regular => label.clone(),
                    Style::Hidden | Style::Calculus => mask(&label),
                };
                Word::new(label, display)
            })
            .collect()
    }
}

/// Masks every character but the first and last with `_`, e.g. `"house"` ->
/// `"h__s_"`. A three-or-fewer-letter word is left alone — nothing useful is
/// hidden by masking a single interior character.
fn mask(label: &str) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= 3 {
        return label.to_string();
    }
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 || i == chars.len() - 1 { *c } else { '_' })
        .collect()
}

/// Default [`CalculusProvider`]: generates small arithmetic expressions whose
/// sum is what the player types. Difficulty widens the operand range.
#[derive(Debug, Default)]
pub struct SimpleCalculusProvider;

impl CalculusProvider for SimpleCalculusProvider {
    fn generate(&self, count: u32, difficulty: Difficulty) -> Vec<Word> {
        let mut rng = rand::rng();
        let max = match difficulty {
            Difficulty::Easy => 10,
            Difficulty::Normal => 50,
            Difficulty::Hard => 200,
        };
        (0..count)
            .map(|_| {
                let a: u32 = rng.random_range(1..=max);
                let b: u32 = rng.random_range(1..=max);
                let label = (a + b).to_string();
                let display = format!("{a} + {b}");
                Word::new(label, display)
            })
            .collect()
    }
}

/// Default [`TopScoreSink`]: logs the round outcome and moves on. A real
/// deployment would swap this for a database-backed sink; the core never
/// notices which one it's talking to.
#[derive(Debug, Default)]
pub struct LoggingTopScoreSink;

impl TopScoreSink for LoggingTopScoreSink {
    fn record(&self, style: Style, language: &str, difficulty: Difficulty, round_scores: &[Score], effective_words_count: u32, mode: Mode) {
        if let Some(top) = round_scores.first() {
            tracing::info!(
                ?style,
                ?mode,
                language,
                ?difficulty,
                effective_words_count,
                winner = top.user_name,
                points = top.points,
                speed = top.speed,
                "round recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_count() {
        let words = StaticDictionaryProvider.generate("en", 10, Style::Regular, Difficulty::Easy);
        assert_eq!(words.len(), 10);
    }

    #[test]
    fn regular_style_keeps_label_as_display() {
        let words = StaticDictionaryProvider.generate("en", 5, Style::Regular, Difficulty::Easy);
        assert!(words.iter().all(|w| w.label == w.display));
    }

    #[test]
    fn hidden_style_masks_interior_characters() {
        let words = StaticDictionaryProvider.generate("en", 20, Style::Hidden, Difficulty::Easy);
        assert!(words.iter().any(|w| w.display != w.label));
    }

    #[test]
    fn oversized_count_still_returns_unique_labels() {
        let words = StaticDictionaryProvider.generate("en", 5000, Style::Regular, Difficulty::Easy);
        let unique: std::collections::HashSet<_> = words.iter().map(|w| w.label.clone()).collect();
        assert_eq!(unique.len(), words.len());
    }

    #[test]
    fn calculus_label_is_the_sum() {
        let words = SimpleCalculusProvider.generate(1, Difficulty::Easy);
        let word = &words[0];
        let parts: Vec<u32> = word.display.split(" + ").map(|p| p.parse().unwrap()).collect();
        assert_eq!(word.label, (parts[0] + parts[1]).to_string());
    }
}
