//! Tictaclink - host-authoritative tic-tac-toe between two processes.
//!
//! One peer hosts behind a shared secret; the other joins. The host owns
//! the real turn state and tells the client whose turn it is. Every mark
//! travels as a typed [`Message`], and each role dispatches incoming
//! messages through its own [`HandlerRegistry`].
//!
//! # Architecture
//!
//! - **Coordinator**: [`GameCoordinator`], the session state machine
//! - **Protocol**: [`Message`] and its JSON-lines encoding
//! - **Transport**: [`TransportLink`] seam, channel links, TCP tasks
//! - **Presentation**: [`Presentation`] callbacks, console rendering
//!
//! # Example
//!
//! ```
//! use tictaclink::{ChannelLink, ConsolePresentation, GameCoordinator, Inbound, Phase, PeerId};
//! use tictaclink_game::{DiagonalPolicy, Player};
//!
//! let mut host: GameCoordinator<ConsolePresentation, ChannelLink> =
//!     GameCoordinator::new(ConsolePresentation::new(Player::Host), DiagonalPolicy::Always);
//! host.start_host("abc123").unwrap();
//!
//! let (link, _outbound) = ChannelLink::new();
//! host.dispatch(Inbound::Connected { peer: PeerId::new(1), link }).unwrap();
//! assert_eq!(host.phase(), Phase::WaitingForPeer);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod console;
mod coordinator;
mod error;
mod gate;
mod handlers;
mod net;
mod presentation;
mod protocol;
mod transport;

// Crate-level exports - Configuration
pub use config::{ConfigError, SECRET_ENV, Settings, secret_from_env};

// Crate-level exports - Console input
pub use console::{CommandError, ConsoleCommand, read_commands, spawn_stdin};

// Crate-level exports - Session
pub use coordinator::{GameCoordinator, Phase};
pub use error::CoordinatorError;
pub use gate::{Secret, SessionGate};
pub use handlers::{Handler, HandlerRegistry};

// Crate-level exports - Wire protocol and transport
pub use net::{EventReceiver, EventSender, MAX_LINE_BYTES, accept_loop, connect, drive};
pub use protocol::{Message, MessageKind, Outcome, PeerId, decode_line, encode_line};
pub use transport::{ChannelLink, Inbound, TransportError, TransportLink};

// Crate-level exports - Presentation
pub use presentation::{ConsolePresentation, Presentation};
