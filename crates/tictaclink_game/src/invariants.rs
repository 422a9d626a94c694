//! First-class invariants for a game.
//!
//! Checked after every applied move in debug builds. They can also be
//! tested on their own.

use super::game::Game;
use super::types::{Board, Player};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Board cells are never overwritten.
///
/// Replaying the history onto an empty board must succeed and
/// reproduce the current board.
pub struct MonotonicBoard;

impl Invariant<Game> for MonotonicBoard {
    fn holds(game: &Game) -> bool {
        let mut rebuilt = Board::new();
        for mv in game.history() {
            if rebuilt.set(mv.row(), mv.col(), mv.player().mark()).is_err() {
                return false;
            }
        }
        rebuilt == *game.board()
    }

    fn description() -> &'static str {
        "Board cells are monotonic (never overwritten)"
    }
}

/// Players alternate, host first.
pub struct AlternatingTurn;

impl Invariant<Game> for AlternatingTurn {
    fn holds(game: &Game) -> bool {
        let history = game.history();

        if history.first().is_some_and(|mv| mv.player() != Player::Host) {
            return false;
        }

        history
            .windows(2)
            .all(|pair| pair[0].player() != pair[1].player())
    }

    fn description() -> &'static str {
        "Players alternate turns (host, client, host, ...)"
    }
}

/// Returns the descriptions of every violated invariant.
pub fn violations(game: &Game) -> Vec<&'static str> {
    let mut violated = Vec::new();
    if !MonotonicBoard::holds(game) {
        violated.push(MonotonicBoard::description());
    }
    if !AlternatingTurn::holds(game) {
        violated.push(AlternatingTurn::description());
    }
    violated
}
