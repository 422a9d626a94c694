//! Typed messages exchanged between host and client.
//!
//! On the wire every message is one JSON object per line, tagged by
//! `"type"`.

use crate::gate::Secret;
use serde::{Deserialize, Serialize};
use tictaclink_game::{GameResult, Player};

/// Identifies one connection as seen by the local process.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("peer-{_0}")]
pub struct PeerId(u64);

impl PeerId {
    /// How a client refers to the host it joined.
    pub const HOST: PeerId = PeerId(0);

    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// One side's half of a finished game, as displayed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Outcome {
    /// Local player completed a line.
    #[serde(rename = "you won")]
    #[strum(to_string = "You Won")]
    YouWon,
    /// Opponent completed a line.
    #[serde(rename = "you lose")]
    #[strum(to_string = "You Lose")]
    YouLose,
    /// Board filled without a line.
    #[serde(rename = "draw")]
    #[strum(to_string = "Game Draw")]
    Draw,
}

impl Outcome {
    /// What `local` should see for `result`, `None` while the game is on.
    pub fn for_player(result: GameResult, local: Player) -> Option<Self> {
        match result {
            GameResult::Ongoing => None,
            GameResult::Draw => Some(Outcome::Draw),
            GameResult::Win(winner) if winner == local => Some(Outcome::YouWon),
            GameResult::Win(_) => Some(Outcome::YouLose),
        }
    }

    /// The other peer's half of the same result.
    pub fn complement(self) -> Self {
        match self {
            Outcome::YouWon => Outcome::YouLose,
            Outcome::YouLose => Outcome::YouWon,
            Outcome::Draw => Outcome::Draw,
        }
    }

    /// Game result implied by `self` from `local`'s point of view.
    pub fn to_result(self, local: Player) -> GameResult {
        match self {
            Outcome::YouWon => GameResult::Win(local),
            Outcome::YouLose => GameResult::Win(local.opponent()),
            Outcome::Draw => GameResult::Draw,
        }
    }
}

/// Message carried by a transport link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::EnumDiscriminants)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum_discriminants(name(MessageKind), derive(Hash, strum::Display))]
pub enum Message {
    /// Client asks to be admitted.
    JoinRequest {
        /// Secret presented to the host's gate.
        secret: Secret,
    },
    /// Host refused the join. Carries no reason.
    JoinRejected,
    /// Two peers are connected and a fresh game begins.
    GameStarted,
    /// Sender marked `(row, col)` with its own mark.
    MoveApplied {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },
    /// Host confirms whose turn it is.
    TurnSync {
        /// Player allowed to move.
        turn: Player,
    },
    /// Sender detected the end of the game; this is the receiver's half.
    ResultNotify {
        /// Outcome to display on the receiving side.
        outcome: Outcome,
    },
    /// Client asks the host to restart.
    RestartRequest,
    /// Host restarted the game.
    RestartApplied,
}

impl Message {
    /// Discriminant used for handler lookup.
    pub fn kind(&self) -> MessageKind {
        MessageKind::from(self)
    }
}

/// Serializes a message as a single line, newline included.
pub fn encode_line(message: &Message) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Parses one line produced by [`encode_line`].
pub fn decode_line(line: &str) -> Result<Message, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}
