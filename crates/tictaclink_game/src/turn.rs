//! Turn arbitration.
//!
//! The host owns the authoritative turn and is the only side allowed to
//! advance it. The client keeps a replica that only moves when the host
//! confirms a new value.

use super::types::Player;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Which copy of the turn state an arbiter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Authority {
    /// Source of truth, lives on the host.
    Authoritative,
    /// Read-mostly copy, lives on the client.
    Replica,
}

/// Error raised when a turn operation is used on the wrong side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TurnError {
    /// Only the authoritative side may advance the turn.
    #[display("Replica turn state cannot advance on its own")]
    NotAuthoritative,
    /// The authoritative side never takes confirmations.
    #[display("Authoritative turn state does not accept confirmations")]
    AlreadyAuthoritative,
}

impl std::error::Error for TurnError {}

/// Single source of truth for whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnArbiter {
    current: Player,
    authority: Authority,
}

impl TurnArbiter {
    /// Creates an arbiter for a fresh game: the host moves first.
    pub fn new(authority: Authority) -> Self {
        Self {
            current: Player::Host,
            authority,
        }
    }

    /// Player allowed to move.
    pub fn current(&self) -> Player {
        self.current
    }

    /// Which copy this is.
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Hands the turn to the other player.
    #[instrument(skip(self), fields(current = %self.current))]
    pub fn advance(&mut self) -> Result<Player, TurnError> {
        if self.authority != Authority::Authoritative {
            return Err(TurnError::NotAuthoritative);
        }
        self.current = self.current.opponent();
        debug!(next = %self.current, "Turn advanced");
        Ok(self.current)
    }

    /// Adopts the turn the host confirmed.
    #[instrument(skip(self), fields(current = %self.current))]
    pub fn confirm(&mut self, player: Player) -> Result<(), TurnError> {
        if self.authority != Authority::Replica {
            return Err(TurnError::AlreadyAuthoritative);
        }
        self.current = player;
        Ok(())
    }

    /// Forces the turn back to `initial`, used when a game restarts.
    pub fn reset(&mut self, initial: Player) {
        self.current = initial;
    }
}
