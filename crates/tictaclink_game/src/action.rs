//! First-class move type and the errors a move can raise.
//!
//! Moves are domain events, not side effects. They can be validated
//! against a game before being applied, and they travel between peers.

use super::types::{BoardError, Player};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A player placing their mark at `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct Move {
    /// Row index, 0 at the top.
    #[getter(copy)]
    row: usize,
    /// Column index, 0 at the left.
    #[getter(copy)]
    col: usize,
    /// The player making the move.
    #[getter(copy)]
    player: Player,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(row: usize, col: usize, player: Player) -> Self {
        Self { row, col, player }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> ({}, {})", self.player, self.row, self.col)
    }
}

/// Error that can occur when validating or applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Row or column outside the board.
    #[display("Position ({row}, {col}) is outside the board")]
    InvalidPosition {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The target cell already holds a mark.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// It's not this player's turn.
    #[display("It's not {_0}'s turn")]
    NotYourTurn(Player),

    /// The game already has a result.
    #[display("Game is already over")]
    GameOver,

    /// An invariant was violated after applying the move.
    #[display("Invariant violation: {_0}")]
    InvariantViolation(String),
}

impl std::error::Error for MoveError {}

impl From<BoardError> for MoveError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::InvalidPosition { row, col } => MoveError::InvalidPosition { row, col },
            BoardError::CellOccupied { row, col } => MoveError::CellOccupied { row, col },
        }
    }
}
