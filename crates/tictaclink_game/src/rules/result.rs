//! Result of evaluating a board.

use super::super::Player;
use serde::{Deserialize, Serialize};

/// Outcome of the game so far.
///
/// Derived after every accepted move, never stored on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Nobody has won and cells remain.
    #[default]
    Ongoing,
    /// Player completed a line.
    Win(Player),
    /// Board full with no line.
    Draw,
}

impl GameResult {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Player> {
        match self {
            GameResult::Win(player) => Some(*player),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    /// Returns `true` for `Win` and `Draw`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameResult::Ongoing)
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Ongoing => write!(f, "Ongoing"),
            GameResult::Win(player) => write!(f, "{} wins", player),
            GameResult::Draw => write!(f, "Draw"),
        }
    }
}
