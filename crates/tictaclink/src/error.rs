//! Coordinator error types.
//!
//! Every variant but `Transport` leaves the coordinator's state untouched
//! and the session carries on. A transport failure ends the peer's session.

use crate::coordinator::Phase;
use crate::protocol::{MessageKind, PeerId};
use crate::transport::TransportError;
use tictaclink_game::{MoveError, Player, TurnError};

/// Error returned by coordinator operations and message handlers.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CoordinatorError {
    /// Row or column outside the board.
    #[display("Position ({row}, {col}) is outside the board")]
    InvalidPosition {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// Target cell already marked.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// Move attempted out of turn.
    #[display("It's not {_0}'s turn")]
    NotYourTurn(Player),

    /// The host's gate declined the join.
    #[display("Join rejected")]
    JoinRejected,

    /// Operation needs a running game.
    #[display("No game in progress (phase: {_0})")]
    NotInProgress(Phase),

    /// Operation needs a session that has a game, finished or not.
    #[display("No active game")]
    NoActiveGame,

    /// Already hosting or joined.
    #[display("Already in a session (phase: {_0})")]
    AlreadyInSession(Phase),

    /// No peer link to send through.
    #[display("Not connected to a peer")]
    NotConnected,

    /// Message from a connection that was never admitted.
    #[display("Unknown peer {_0}")]
    UnknownPeer(PeerId),

    /// No handler registered for this message in the current role.
    #[display("Unexpected {kind} message for role {role:?}")]
    UnexpectedMessage {
        /// Kind of the message received.
        kind: MessageKind,
        /// Local role, if any.
        role: Option<Player>,
    },

    /// Turn state used from the wrong side.
    #[display("Turn error: {_0}")]
    Turn(TurnError),

    /// Internal consistency check failed.
    #[display("Invariant violation: {_0}")]
    Invariant(String),

    /// The transport refused the message.
    #[display("Transport error: {_0}")]
    Transport(TransportError),
}

impl std::error::Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoordinatorError::Turn(err) => Some(err),
            CoordinatorError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MoveError> for CoordinatorError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::InvalidPosition { row, col } => CoordinatorError::InvalidPosition { row, col },
            MoveError::CellOccupied { row, col } => CoordinatorError::CellOccupied { row, col },
            MoveError::NotYourTurn(player) => CoordinatorError::NotYourTurn(player),
            MoveError::GameOver => CoordinatorError::NotInProgress(Phase::Finished),
            MoveError::InvariantViolation(detail) => CoordinatorError::Invariant(detail),
        }
    }
}

impl From<TurnError> for CoordinatorError {
    fn from(err: TurnError) -> Self {
        CoordinatorError::Turn(err)
    }
}

impl From<TransportError> for CoordinatorError {
    fn from(err: TransportError) -> Self {
        CoordinatorError::Transport(err)
    }
}
