//! Per-role message handler registry.
//!
//! The host and the client accept different messages. Each role gets its
//! own table keyed by [`MessageKind`]; a message with no entry for the
//! local role is refused before it touches any state.

use crate::coordinator::GameCoordinator;
use crate::error::CoordinatorError;
use crate::presentation::Presentation;
use crate::protocol::{Message, MessageKind, PeerId};
use crate::transport::TransportLink;
use std::collections::HashMap;
use tictaclink_game::Player;
use tracing::instrument;

/// Function invoked for one kind of message.
pub type Handler<P, L> =
    fn(&mut GameCoordinator<P, L>, PeerId, Message) -> Result<(), CoordinatorError>;

/// Dispatch table for one role.
pub struct HandlerRegistry<P, L> {
    role: Player,
    handlers: HashMap<MessageKind, Handler<P, L>>,
}

impl<P, L> std::fmt::Debug for HandlerRegistry<P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("role", &self.role)
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<P: Presentation, L: TransportLink> HandlerRegistry<P, L> {
    /// Creates an empty registry for `role`.
    pub fn empty(role: Player) -> Self {
        Self {
            role,
            handlers: HashMap::new(),
        }
    }

    /// Handlers the host runs.
    #[instrument]
    pub fn host() -> Self {
        let mut registry = Self::empty(Player::Host);
        registry
            .register(MessageKind::JoinRequest, host::join_request)
            .register(MessageKind::MoveApplied, shared::move_applied)
            .register(MessageKind::ResultNotify, shared::result_notify)
            .register(MessageKind::RestartRequest, host::restart_request);
        registry
    }

    /// Handlers the client runs.
    #[instrument]
    pub fn client() -> Self {
        let mut registry = Self::empty(Player::Client);
        registry
            .register(MessageKind::JoinRejected, client::join_rejected)
            .register(MessageKind::GameStarted, client::game_started)
            .register(MessageKind::MoveApplied, shared::move_applied)
            .register(MessageKind::TurnSync, client::turn_sync)
            .register(MessageKind::ResultNotify, shared::result_notify)
            .register(MessageKind::RestartApplied, client::restart_applied);
        registry
    }

    /// Installs or replaces the handler for `kind`.
    pub fn register(&mut self, kind: MessageKind, handler: Handler<P, L>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Role this table serves.
    pub fn role(&self) -> Player {
        self.role
    }

    /// Handler for `kind`, if the role accepts it.
    pub fn get(&self, kind: MessageKind) -> Option<Handler<P, L>> {
        self.handlers.get(&kind).copied()
    }

    /// Returns `true` if the role accepts `kind`.
    pub fn accepts(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

fn mismatch(message: &Message, role: Option<Player>) -> CoordinatorError {
    CoordinatorError::UnexpectedMessage {
        kind: message.kind(),
        role,
    }
}

mod shared {
    use super::*;

    pub fn move_applied<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::MoveApplied { row, col } => coordinator.on_remote_move(row, col),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }

    pub fn result_notify<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::ResultNotify { outcome } => coordinator.on_result_notified(outcome),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }
}

mod host {
    use super::*;

    pub fn join_request<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::JoinRequest { secret } => coordinator.on_join_request(peer, &secret),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }

    pub fn restart_request<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::RestartRequest => coordinator.restart_as_host(),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }
}

mod client {
    use super::*;

    pub fn join_rejected<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::JoinRejected => coordinator.on_join_rejected(),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }

    pub fn game_started<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::GameStarted => coordinator.on_game_started(),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }

    pub fn turn_sync<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::TurnSync { turn } => coordinator.on_turn_confirmed(turn),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }

    pub fn restart_applied<P: Presentation, L: TransportLink>(
        coordinator: &mut GameCoordinator<P, L>,
        _peer: PeerId,
        message: Message,
    ) -> Result<(), CoordinatorError> {
        match message {
            Message::RestartApplied => coordinator.on_restart_applied(),
            other => Err(mismatch(&other, coordinator.role())),
        }
    }
}
