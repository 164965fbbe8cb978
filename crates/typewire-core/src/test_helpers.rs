//! Shared test scaffolding, reused by `typewire-server`'s integration tests
//! behind the `test-helpers` feature (mirrors the teacher crate's
//! `test_helpers` module).

use uuid::Uuid;

use crate::game::{Game, Seat};
use crate::game_descriptor::{GameDescriptor, Mode, Style};
use crate::session::Difficulty;

pub fn make_seats(names: &[&str]) -> Vec<Seat> {
    names.iter().map(|n| Seat { handle: Uuid::new_v4(), display_name: n.to_string() }).collect()
}

pub fn make_descriptor(id: u64, players: &[&str], mode: Mode, style: Style, rounds: u32, words_count: u32) -> GameDescriptor {
    let mut descriptor = GameDescriptor::new(id, players[0], style, mode, rounds, words_count, "en", Difficulty::Easy);
    descriptor.players = players.iter().map(|n| n.to_string()).collect();
    descriptor
}

pub fn make_game(id: u64, players: &[&str], mode: Mode) -> Game {
    let descriptor = make_descriptor(id, players, mode, Style::Regular, 1, 5);
    Game::start(descriptor, make_seats(players))
}
