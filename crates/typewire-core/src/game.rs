use std::collections::HashMap;

use crate::game_descriptor::{GameDescriptor, Mode, Style};
use crate::score::{Score, compute_speed, sort_game_scores, sort_round_scores};
use crate::session::{Difficulty, SessionHandle};
use crate::word::Word;

pub type GameId = u64;

/// A single player seat in a running game, in join order. `sessions[0]`
/// is the manager-election fallback (source spec §4.6).
#[derive(Debug, Clone)]
pub struct Seat {
    pub handle: SessionHandle,
    pub display_name: String,
}

/// The word pool shape, keyed by [`Mode`] (source spec §4.5, §9).
#[derive(Debug, Clone)]
pub enum WordAssignments {
    /// One shared pool; every player competes for the same labels.
    Capture(HashMap<String, Word>),
    /// Each player's own private copy of the full generated list, keyed by
    /// display name then label.
    Race(HashMap<String, HashMap<String, Word>>),
}

impl WordAssignments {
    fn capture(words: Vec<Word>) -> Self {
        WordAssignments::Capture(words.into_iter().map(|w| (w.label.clone(), w)).collect())
    }

    fn race(words: Vec<Word>, players: &[Seat]) -> Self {
        let per_player = players
            .iter()
            .map(|seat| {
                let copy: HashMap<String, Word> = words.iter().cloned().map(|w| (w.label.clone(), w)).collect();
                (seat.display_name.clone(), copy)
            })
            .collect();
        WordAssignments::Race(per_player)
    }

    /// Flattens to the wire shape used in `words-list` and `scores` (source
    /// spec's "words" payload): Capture emits the shared pool once; Race
    /// emits one player's list (the caller supplies which, since each is
    /// independently private — by convention the manager's view is used for
    /// the end-of-round summary). `label` is redacted on every word still
    /// unclaimed, so a Hidden/Calculus `display` can't be bypassed by reading
    /// the raw payload; it is revealed once `claimed_by` is set.
    pub fn view(&self, player: Option<&str>) -> Vec<Word> {
        match self {
            WordAssignments::Capture(words) => {
                let mut out: Vec<Word> = words.values().map(Word::for_wire).collect();
                out.sort_by(|a, b| a.display.cmp(&b.display));
                out
            },
            WordAssignments::Race(per_player) => {
                let key = player.or_else(|| per_player.keys().next().map(String::as_str));
                key.and_then(|k| per_player.get(k))
                    .map(|words| {
                        let mut out: Vec<Word> = words.values().map(Word::for_wire).collect();
                        out.sort_by(|a, b| a.display.cmp(&b.display));
                        out
                    })
                    .unwrap_or_default()
            },
        }
    }
}

/// Outcome of a `claim-word` attempt (source spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim accepted; `round_complete` says whether this was the claim that
    /// satisfies the mode's termination condition.
    Accepted { round_complete: bool },
    /// Label unknown, already claimed, or (Race) not part of this player's
    /// private list. Silently ignored by the caller (no reply, no state
    /// change) per source spec §7.
    Rejected,
}

/// Outcome of `endRound` (source spec §4.5 step 7).
#[derive(Debug, Clone)]
pub struct RoundResult {
    pub round_scores: Vec<Score>,
    pub game_scores: Vec<Score>,
    pub manager: String,
    pub game_over: bool,
    pub words: Vec<Word>,
}

/// Outcome of removing a player from a running game (source spec §4.6).
#[derive(Debug, Clone)]
pub struct DisconnectOutcome {
    /// `Some(name)` when the manager left and a successor was elected.
    pub new_manager: Option<String>,
    /// True when the player set is now empty; the caller must destroy the
    /// game (bump the epoch so in-flight timers no-op, remove from the
    /// running-games table, and tell the Lobby to re-broadcast).
    pub game_destroyed: bool,
}

/// A started game: all descriptor fields, plus the round-lifecycle state.
/// Owned exclusively by its game worker for the game's lifetime (source
/// spec §5) — nothing here is `Send`-gated by the core; the server crate is
/// responsible for single-writer access.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    pub style: Style,
    pub mode: Mode,
    pub rounds: u32,
    pub declared_words_count: u32,
    pub language: String,
    pub difficulty: Difficulty,
    pub manager: String,
    pub seats: Vec<Seat>,
    pub round_id: u32,
    pub round_epoch: u64,
    pub round_start_millis: i64,
    pub effective_words_count: u32,
    pub user_scores: HashMap<String, Score>,
    pub word_assignments: Option<WordAssignments>,
}

impl Game {
    pub fn start(descriptor: GameDescriptor, seats: Vec<Seat>) -> Self {
        let manager = descriptor.creator.clone();
        let mut user_scores = HashMap::new();
        for seat in &seats {
            user_scores.insert(seat.display_name.clone(), Score::new(seat.display_name.clone()));
        }
        Self {
            id: descriptor.id,
            style: descriptor.style,
            mode: descriptor.mode,
            rounds: descriptor.rounds,
            declared_words_count: descriptor.words_count,
            language: descriptor.language,
            difficulty: descriptor.difficulty,
            manager,
            seats,
            round_id: 0,
            round_epoch: 0,
            round_start_millis: 0,
            effective_words_count: 0,
            user_scores,
            word_assignments: None,
        }
    }

    pub fn player_count(&self) -> u32 {
        self.seats.len() as u32
    }

    pub fn is_manager(&self, display_name: &str) -> bool {
        self.manager == display_name
    }

    /// `startCountdown()` steps 1 and 3 (the broadcast itself and the +5s
    /// schedule are the caller's job). Returns the epoch the caller must
    /// capture for the `startPlay` timer.
    pub fn start_countdown(&mut self) -> u64 {
        self.round_id += 1;
        for score in self.user_scores.values_mut() {
            score.reset_points();
        }
        self.round_epoch += 1;
        self.round_epoch
    }

    /// `startPlay()` steps 3-4; the caller checks the epoch guard (step 1)
    /// before calling, generates `words` via the dictionary/calculus
    /// collaborator (step 2, count = `effective_words_count`), and schedules
    /// `claim_remaining_words` at +expiration (step 6) afterwards.
    pub fn start_play(&mut self, words: Vec<Word>, now_millis: i64) {
        self.effective_words_count = self.mode.effective_words_count(self.declared_words_count, self.player_count());
        self.word_assignments = Some(match self.mode {
            Mode::Capture => WordAssignments::capture(words),
            Mode::Race => WordAssignments::race(words, &self.seats),
        });
        self.round_start_millis = now_millis;
    }

    /// `claimWord(session, label)`, RUNNING only (checked by the caller's
    /// FSM gate). `claimant` is the session's display name.
    pub fn claim_word(&mut self, claimant: &str, label: &str) -> ClaimOutcome {
        let Some(assignments) = self.word_assignments.as_mut() else {
            return ClaimOutcome::Rejected;
        };
        let accepted = match assignments {
            WordAssignments::Capture(words) => match words.get_mut(label) {
                Some(word) if word.claimed_by.is_none() => {
                    word.claimed_by = Some(claimant.to_string());
                    let complete = words.values().all(|w| w.claimed_by.is_some());
                    Some(complete)
                },
                _ => None,
            },
            WordAssignments::Race(per_player) => match per_player.get_mut(claimant) {
                Some(words) => match words.get_mut(label) {
                    Some(word) if word.claimed_by.is_none() => {
                        word.claimed_by = Some(claimant.to_string());
                        let complete = words.values().all(|w| w.claimed_by.is_some());
                        Some(complete)
                    },
                    _ => None,
                },
                None => None,
            },
        };

        match accepted {
            Some(round_complete) => {
                if let Some(score) = self.user_scores.get_mut(claimant) {
                    score.points += 1;
                } else {
                    tracing::warn!(game_id = self.id, claimant, "claim accepted for unknown score entry");
                }
                ClaimOutcome::Accepted { round_complete }
            },
            None => ClaimOutcome::Rejected,
        }
    }

    /// `claimRemainingWords(epoch)` — the epoch check is the caller's job
    /// (it owns the scheduler); once called, this is just `endRound` with
    /// whatever has been claimed so far.
    pub fn end_round(&mut self, now_millis: i64) -> RoundResult {
        self.round_epoch += 1;

        for score in self.user_scores.values_mut() {
            score.speed = compute_speed(score.points, self.round_start_millis, now_millis);
            if score.speed > score.best_speed {
                score.best_speed = score.speed;
            }
        }

        let mut round_scores: Vec<Score> = self.seats.iter().filter_map(|s| self.user_scores.get(&s.display_name).cloned()).collect();
        sort_round_scores(&mut round_scores);

        if let Some(winner) = round_scores.first() {
            let winner_name = winner.user_name.clone();
            if let Some(score) = self.user_scores.get_mut(&winner_name) {
                score.victories += 1;
                score.latest_victory_timestamp = now_millis;
            }
        }

        let mut game_scores: Vec<Score> = self.seats.iter().filter_map(|s| self.user_scores.get(&s.display_name).cloned()).collect();
        sort_game_scores(&mut game_scores);

        let game_over = game_scores.first().is_some_and(|s| s.victories >= self.rounds);
        let words = self.word_assignments.as_ref().map(|w| w.view(Some(self.manager.as_str()))).unwrap_or_default();

        RoundResult {
            round_scores,
            game_scores,
            manager: self.manager.clone(),
            game_over,
            words,
        }
    }

    /// Removes a player on disconnect (source spec §4.6). Score history is
    /// left in `user_scores` (it is keyed by name, not seat) so a rejoining
    /// player under the same name within the same game instance would keep
    /// it, though the source spec defines no reconnection path — disconnect
    /// is terminal.
    pub fn remove_player(&mut self, handle: SessionHandle) -> DisconnectOutcome {
        let Some(pos) = self.seats.iter().position(|s| s.handle == handle) else {
            return DisconnectOutcome { new_manager: None, game_destroyed: self.seats.is_empty() };
        };
        let removed = self.seats.remove(pos);
        let was_manager = removed.display_name == self.manager;

        if self.seats.is_empty() {
            return DisconnectOutcome { new_manager: None, game_destroyed: true };
        }

        if was_manager {
            self.manager = self.seats[0].display_name.clone();
            DisconnectOutcome { new_manager: Some(self.manager.clone()), game_destroyed: false }
        } else {
            DisconnectOutcome { new_manager: None, game_destroyed: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_descriptor::GameDescriptor;

    fn seats(names: &[&str]) -> Vec<Seat> {
        names
            .iter()
            .map(|n| Seat { handle: SessionHandle::new_v4(), display_name: n.to_string() })
            .collect()
    }

    fn capture_game(players: &[&str]) -> Game {
        let descriptor = GameDescriptor::new(1, players[0], Style::Regular, Mode::Capture, 1, 5, "en", Difficulty::Easy);
        Game::start(descriptor, seats(players))
    }

    #[test]
    fn start_countdown_increments_round_and_epoch_and_resets_scores() {
        let mut game = capture_game(&["alice"]);
        game.user_scores.get_mut("alice").unwrap().points = 9;
        let epoch = game.start_countdown();
        assert_eq!(epoch, 1);
        assert_eq!(game.round_id, 1);
        assert_eq!(game.user_scores["alice"].points, 0);
    }

    #[test]
    fn capture_claim_is_exclusive() {
        let mut game = capture_game(&["alice", "bob"]);
        game.start_countdown();
        game.start_play(vec![Word::new("cat", "cat")], 0);

        let first = game.claim_word("alice", "cat");
        assert_eq!(first, ClaimOutcome::Accepted { round_complete: true });
        assert_eq!(game.user_scores["alice"].points, 1);

        let second = game.claim_word("bob", "cat");
        assert_eq!(second, ClaimOutcome::Rejected);
        assert_eq!(game.user_scores["bob"].points, 0);
    }

    #[test]
    fn capture_round_completes_when_all_words_claimed() {
        let mut game = capture_game(&["alice", "bob"]);
        game.start_countdown();
        game.start_play(vec![Word::new("cat", "cat"), Word::new("dog", "dog")], 0);

        assert_eq!(game.claim_word("alice", "cat"), ClaimOutcome::Accepted { round_complete: false });
        assert_eq!(game.claim_word("bob", "dog"), ClaimOutcome::Accepted { round_complete: true });
    }

    #[test]
    fn race_claim_is_private_per_player() {
        let mut game = Game::start(
            GameDescriptor::new(1, "alice", Style::Regular, Mode::Race, 1, 1, "en", Difficulty::Easy),
            seats(&["alice", "bob"]),
        );
        game.start_countdown();
        // declared=1, 2 players -> effective=2, each player gets both words privately.
        game.start_play(vec![Word::new("cat", "cat"), Word::new("dog", "dog")], 0);

        assert_eq!(game.claim_word("alice", "cat"), ClaimOutcome::Accepted { round_complete: false });
        // Bob's copy of "cat" is untouched by Alice's claim.
        assert_eq!(game.claim_word("bob", "cat"), ClaimOutcome::Accepted { round_complete: false });
        assert_eq!(game.claim_word("alice", "dog"), ClaimOutcome::Accepted { round_complete: true });
        assert_eq!(game.user_scores["alice"].points, 2);
        assert_eq!(game.user_scores["bob"].points, 1);
    }

    #[test]
    fn unknown_label_rejected() {
        let mut game = capture_game(&["alice"]);
        game.start_countdown();
        game.start_play(vec![Word::new("cat", "cat")], 0);
        assert_eq!(game.claim_word("alice", "nope"), ClaimOutcome::Rejected);
    }

    #[test]
    fn end_round_sorts_scores_and_awards_victory() {
        let mut game = capture_game(&["alice", "bob"]);
        game.start_countdown();
        game.start_play(vec![Word::new("cat", "cat"), Word::new("dog", "dog")], 0);
        game.claim_word("alice", "cat");
        game.claim_word("alice", "dog");

        let result = game.end_round(60_000);
        assert_eq!(result.round_scores[0].user_name, "alice");
        assert_eq!(result.game_scores[0].user_name, "alice");
        assert_eq!(result.game_scores[0].victories, 1);
        assert!(result.game_over, "rounds == 1, one victory reaches it");
    }

    #[test]
    fn manager_reelected_to_first_remaining_seat() {
        let mut game = capture_game(&["alice", "bob"]);
        let alice_handle = game.seats[0].handle;
        let outcome = game.remove_player(alice_handle);
        assert_eq!(outcome.new_manager.as_deref(), Some("bob"));
        assert!(!outcome.game_destroyed);
        assert_eq!(game.manager, "bob");
    }

    #[test]
    fn last_player_leaving_destroys_game() {
        let mut game = capture_game(&["alice"]);
        let handle = game.seats[0].handle;
        let outcome = game.remove_player(handle);
        assert!(outcome.game_destroyed);
        assert!(outcome.new_manager.is_none());
    }

    #[test]
    fn non_manager_leaving_does_not_change_manager() {
        let mut game = capture_game(&["alice", "bob"]);
        let bob_handle = game.seats[1].handle;
        let outcome = game.remove_player(bob_handle);
        assert!(outcome.new_manager.is_none());
        assert_eq!(game.manager, "alice");
    }
}
