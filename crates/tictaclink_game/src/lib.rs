//! Tictaclink game rules - the pure half of host/client tic-tac-toe.
//!
//! Nothing in this crate performs I/O. Both peers run the same rules; what
//! differs between them is only which copy of the turn state they hold.
//!
//! # Example
//!
//! ```
//! use tictaclink_game::{Authority, DiagonalPolicy, Game, GameResult, Move, Player};
//!
//! let mut game = Game::new(Authority::Authoritative, DiagonalPolicy::Always);
//! game.validate(1, 1, Player::Host).unwrap();
//! assert_eq!(game.apply(Move::new(1, 1, Player::Host)).unwrap(), GameResult::Ongoing);
//! assert_eq!(game.advance_turn().unwrap(), Player::Client);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod game;
mod invariants;
mod rules;
mod turn;
mod types;

pub use action::{Move, MoveError};
pub use game::Game;
pub use invariants::{AlternatingTurn, Invariant, MonotonicBoard, violations};
pub use rules::{DiagonalPolicy, GameResult, WinDetector, win::evaluate};
pub use turn::{Authority, TurnArbiter, TurnError};
pub use types::{BOARD_SIZE, Board, BoardError, Mark, Player};
