//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Move, Player, BOARD_SIZE};
use super::GameResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Whether diagonals are checked for every move or only for moves on them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiagonalPolicy {
    /// Both diagonals are checked no matter where the last mark landed.
    #[default]
    Always,
    /// A diagonal is only checked when the last mark lies on it.
    ThroughMove,
}

/// Evaluates terminal conditions around the most recent move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinDetector {
    policy: DiagonalPolicy,
}

impl WinDetector {
    /// Creates a detector with the given diagonal policy.
    pub fn new(policy: DiagonalPolicy) -> Self {
        Self { policy }
    }

    /// Diagonal policy in use.
    pub fn policy(&self) -> DiagonalPolicy {
        self.policy
    }

    /// Evaluates the board after `last_move` was placed.
    ///
    /// Lines are checked in a fixed order: column, row, main diagonal,
    /// anti-diagonal. Each needs three identical non-empty marks.
    #[instrument(skip(board), fields(policy = %self.policy))]
    pub fn evaluate(&self, board: &Board, last_move: &Move) -> GameResult {
        let (row, col) = (last_move.row(), last_move.col());

        if let Some(winner) = self.completed_line(board, row, col) {
            debug!(%winner, row, col, "Line completed");
            return GameResult::Win(winner);
        }

        if board.is_full() {
            debug!("Board full without a line");
            GameResult::Draw
        } else {
            GameResult::Ongoing
        }
    }

    fn completed_line(&self, board: &Board, row: usize, col: usize) -> Option<Player> {
        let mark = board.get(row, col).ok()?;
        let player = Player::from_mark(mark)?;

        let column = [(0, col), (1, col), (2, col)];
        let line = [(row, 0), (row, 1), (row, 2)];
        let main = [(0, 0), (1, 1), (2, 2)];
        let anti = [(0, 2), (1, 1), (2, 0)];

        let on_main = row == col;
        let on_anti = row + col == BOARD_SIZE - 1;
        let gate = |on_line: bool| match self.policy {
            DiagonalPolicy::Always => true,
            DiagonalPolicy::ThroughMove => on_line,
        };

        let won = all_match(board, column, mark)
            || all_match(board, line, mark)
            || (gate(on_main) && all_match(board, main, mark))
            || (gate(on_anti) && all_match(board, anti, mark));

        won.then_some(player)
    }
}

fn all_match(board: &Board, cells: [(usize, usize); 3], mark: Mark) -> bool {
    cells
        .iter()
        .all(|&(r, c)| board.get(r, c).is_ok_and(|m| m == mark))
}

/// Evaluates with the default (always check diagonals) policy.
pub fn evaluate(board: &Board, last_move: &Move) -> GameResult {
    WinDetector::default().evaluate(board, last_move)
}
