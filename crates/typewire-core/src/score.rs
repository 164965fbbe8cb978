use serde::{Deserialize, Serialize};

/// A player's score within a game. `points`/`speed` are per-round and reset
/// at the start of every round; `victories`/`best_speed` accumulate across
/// the whole game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub user_name: String,
    pub points: u32,
    pub speed: f64,
    pub best_speed: f64,
    pub victories: u32,
    pub latest_victory_timestamp: i64,
    #[serde(default)]
    pub awards: Vec<String>,
}

impl Score {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            points: 0,
            speed: 0.0,
            best_speed: 0.0,
            victories: 0,
            latest_victory_timestamp: 0,
            awards: Vec::new(),
        }
    }

    /// Zeros the per-round fields between rounds; cumulative fields are
    /// untouched.
    pub fn reset_points(&mut self) {
        self.points = 0;
        self.speed = 0.0;
    }
}

/// `speed == points * 60000 / (now - round_start_millis)`, guarding against a
/// zero or negative elapsed time (clock skew, or a round ended in the same
/// millisecond it started under test).
pub fn compute_speed(points: u32, round_start_millis: i64, now_millis: i64) -> f64 {
    let elapsed = (now_millis - round_start_millis).max(1) as f64;
    (points as f64) * 60_000.0 / elapsed
}

/// Sorts round scores by `(-points, -speed)`, the order in which round
/// victory is awarded (source spec §8).
pub fn sort_round_scores(scores: &mut [Score]) {
    scores.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.speed.partial_cmp(&a.speed).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// Sorts game scores by `(-victories, -best_speed, +latest_victory_timestamp)`.
pub fn sort_game_scores(scores: &mut [Score]) {
    scores.sort_by(|a, b| {
        b.victories
            .cmp(&a.victories)
            .then_with(|| b.best_speed.partial_cmp(&a.best_speed).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.latest_victory_timestamp.cmp(&b.latest_victory_timestamp))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_formula() {
        // 4 points in exactly one minute == 4 words/min.
        assert_eq!(compute_speed(4, 0, 60_000), 4.0);
    }

    #[test]
    fn speed_guards_against_zero_elapsed() {
        assert!(compute_speed(4, 1000, 1000).is_finite());
    }

    #[test]
    fn round_scores_sorted_by_points_then_speed() {
        let mut scores = vec![
            Score { points: 1, speed: 10.0, ..Score::new("a") },
            Score { points: 4, speed: 5.0, ..Score::new("b") },
            Score { points: 4, speed: 9.0, ..Score::new("c") },
        ];
        sort_round_scores(&mut scores);
        assert_eq!(scores.iter().map(|s| s.user_name.as_str()).collect::<Vec<_>>(), ["c", "b", "a"]);
    }

    #[test]
    fn game_scores_sorted_by_victories_then_best_speed_then_timestamp_ascending() {
        let mut scores = vec![
            Score { victories: 1, best_speed: 5.0, latest_victory_timestamp: 200, ..Score::new("a") },
            Score { victories: 1, best_speed: 5.0, latest_victory_timestamp: 100, ..Score::new("b") },
            Score { victories: 2, best_speed: 1.0, latest_victory_timestamp: 999, ..Score::new("c") },
        ];
        sort_game_scores(&mut scores);
        assert_eq!(scores.iter().map(|s| s.user_name.as_str()).collect::<Vec<_>>(), ["c", "b", "a"]);
    }

    #[test]
    fn reset_points_zeros_round_fields_only() {
        let mut s = Score::new("a");
        s.points = 3;
        s.speed = 40.0;
        s.victories = 2;
        s.best_speed = 40.0;
        s.reset_points();
        assert_eq!(s.points, 0);
        assert_eq!(s.speed, 0.0);
        assert_eq!(s.victories, 2);
        assert_eq!(s.best_speed, 40.0);
    }

    proptest::proptest! {
        #[test]
        fn round_scores_always_come_out_non_increasing(pairs in proptest::collection::vec((0u32..50, 0.0f64..500.0), 0..12)) {
            let mut scores: Vec<Score> = pairs
                .into_iter()
                .enumerate()
                .map(|(i, (points, speed))| Score { points, speed, ..Score::new(format!("p{i}")) })
                .collect();
            sort_round_scores(&mut scores);
            for pair in scores.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let a_key = (a.points, a.speed);
                let b_key = (b.points, b.speed);
                prop_assert!(a_key.0 > b_key.0 || (a_key.0 == b_key.0 && a_key.1 >= b_key.1));
            }
        }

        #[test]
        fn game_scores_always_come_out_non_increasing(triples in proptest::collection::vec((0u32..20, 0.0f64..500.0, 0i64..10_000), 0..12)) {
            let mut scores: Vec<Score> = triples
                .into_iter()
                .enumerate()
                .map(|(i, (victories, best_speed, ts))| Score { victories, best_speed, latest_victory_timestamp: ts, ..Score::new(format!("p{i}")) })
                .collect();
            sort_game_scores(&mut scores);
            for pair in scores.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(
                    a.victories > b.victories
                        || (a.victories == b.victories && a.best_speed > b.best_speed)
                        || (a.victories == b.victories && a.best_speed == b.best_speed && a.latest_victory_timestamp <= b.latest_victory_timestamp)
                );
            }
        }
    }
}
