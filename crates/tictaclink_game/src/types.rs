//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// Symbol occupying a cell.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Mark {
    /// Nobody has played here yet.
    #[default]
    #[strum(to_string = ".")]
    Empty,
    /// Host's mark.
    X,
    /// Client's mark.
    O,
}

/// One of the two peers of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// The authoritative peer, always plays X.
    Host,
    /// The joining peer, always plays O.
    Client,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::Host => Player::Client,
            Player::Client => Player::Host,
        }
    }

    /// Mark this player places on the board.
    pub fn mark(self) -> Mark {
        match self {
            Player::Host => Mark::X,
            Player::Client => Mark::O,
        }
    }

    /// Player owning a mark, `None` for [`Mark::Empty`].
    pub fn from_mark(mark: Mark) -> Option<Self> {
        match mark {
            Mark::X => Some(Player::Host),
            Mark::O => Some(Player::Client),
            Mark::Empty => None,
        }
    }
}

/// Error raised by board mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BoardError {
    /// Row or column outside `0..3`.
    #[display("Position ({row}, {col}) is outside the board")]
    InvalidPosition {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The cell already holds a mark.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}

impl std::error::Error for BoardError {}

/// 3x3 tic-tac-toe board in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Mark; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from rows, mostly useful for tests and replays.
    pub fn from_rows(cells: [[Mark; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Returns `true` if `(row, col)` addresses a cell.
    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE
    }

    /// Gets the mark at the given position.
    pub fn get(&self, row: usize, col: usize) -> Result<Mark, BoardError> {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .ok_or(BoardError::InvalidPosition { row, col })
    }

    /// Places a mark on an empty cell.
    ///
    /// Once set, a cell only changes again through [`Board::reset`].
    #[instrument(skip(self))]
    pub fn set(&mut self, row: usize, col: usize, mark: Mark) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(BoardError::InvalidPosition { row, col })?;

        if *cell != Mark::Empty {
            return Err(BoardError::CellOccupied { row, col });
        }

        *cell = mark;
        trace!(row, col, %mark, "Cell marked");
        Ok(())
    }

    /// Checks if a cell is empty. Out-of-range positions are never empty.
    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        matches!(self.get(row, col), Ok(Mark::Empty))
    }

    /// Returns `true` once no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|m| *m != Mark::Empty)
    }

    /// Clears every cell.
    pub fn reset(&mut self) {
        self.cells = [[Mark::Empty; BOARD_SIZE]; BOARD_SIZE];
    }

    /// Every cell with its position, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Mark)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(row, marks)| marks.iter().enumerate().map(move |(col, mark)| (row, col, *mark)))
    }

    /// Positions of every empty cell, row-major.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cells[row][col] == Mark::Empty)
            .collect()
    }

    /// Number of marks placed so far.
    pub fn filled(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|m| **m != Mark::Empty)
            .count()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            write!(f, "{}|{}|{}", row[0], row[1], row[2])?;
            if i < BOARD_SIZE - 1 {
                f.write_str("\n-+-+-\n")?;
            }
        }
        Ok(())
    }
}
