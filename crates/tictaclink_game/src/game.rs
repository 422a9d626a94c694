//! One board plus turn-state lifetime.

use super::action::{Move, MoveError};
use super::rules::{DiagonalPolicy, GameResult, WinDetector};
use super::turn::{Authority, TurnArbiter, TurnError};
use super::types::{Board, Player};
use tracing::{debug, instrument};

/// A single game from creation until it finishes or restarts.
///
/// The turn is never flipped by [`Game::apply`]: whether and how the turn
/// moves on depends on which side owns the authoritative copy.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) history: Vec<Move>,
    turn: TurnArbiter,
    result: GameResult,
    detector: WinDetector,
}

impl Game {
    /// Creates a fresh game: empty board, host to move.
    #[instrument]
    pub fn new(authority: Authority, policy: DiagonalPolicy) -> Self {
        Self {
            board: Board::new(),
            history: Vec::new(),
            turn: TurnArbiter::new(authority),
            result: GameResult::Ongoing,
            detector: WinDetector::new(policy),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the turn state.
    pub fn turn(&self) -> &TurnArbiter {
        &self.turn
    }

    /// Result of the last evaluation.
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Moves applied so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Checks whether `player` may mark `(row, col)` right now.
    ///
    /// Occupancy is reported before turn ownership.
    #[instrument(skip(self))]
    pub fn validate(&self, row: usize, col: usize, player: Player) -> Result<(), MoveError> {
        if self.result.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if !Board::in_bounds(row, col) {
            return Err(MoveError::InvalidPosition { row, col });
        }
        if !self.board.is_empty(row, col) {
            return Err(MoveError::CellOccupied { row, col });
        }
        if self.turn.current() != player {
            return Err(MoveError::NotYourTurn(player));
        }
        Ok(())
    }

    /// Marks the board for `mv` and re-evaluates the result.
    ///
    /// Turn ownership is not checked here. The move is committed only if
    /// it succeeds; on any error the game is left exactly as it was.
    #[instrument(skip(self, mv), fields(mv = %mv))]
    pub fn apply(&mut self, mv: Move) -> Result<GameResult, MoveError> {
        if self.result.is_terminal() {
            return Err(MoveError::GameOver);
        }

        let mut next = self.clone();
        next.board.set(mv.row(), mv.col(), mv.player().mark())?;
        next.history.push(mv);
        next.result = next.detector.evaluate(&next.board, &mv);

        #[cfg(debug_assertions)]
        {
            let violated = super::invariants::violations(&next);
            if !violated.is_empty() {
                tracing::warn!(?violated, "Invariant violated by move, not applied");
                return Err(MoveError::InvariantViolation(violated.join("; ")));
            }
        }

        *self = next;
        debug!(result = %self.result, "Move applied");
        Ok(self.result)
    }

    /// Passes the turn on (authoritative side only).
    pub fn advance_turn(&mut self) -> Result<Player, TurnError> {
        self.turn.advance()
    }

    /// Adopts a turn confirmed by the host (replica side only).
    pub fn confirm_turn(&mut self, player: Player) -> Result<(), TurnError> {
        self.turn.confirm(player)
    }

    /// Records a terminal result reported by the peer.
    pub fn conclude(&mut self, result: GameResult) {
        self.result = result;
    }

    /// Clears board, history and result; host moves first again.
    #[instrument(skip(self))]
    pub fn restart(&mut self) {
        self.board.reset();
        self.history.clear();
        self.turn.reset(Player::Host);
        self.result = GameResult::Ongoing;
    }
}
