//! Session coordinator.
//!
//! [`GameCoordinator`] is the one context object a process owns. The
//! presentation and the transport receive loop both talk to it by
//! reference; there is no process-wide state.
//!
//! The host is authoritative. It owns the gate and the real turn state,
//! and tells the client whose turn it is with `TurnSync`. The client keeps
//! a replica that only moves when the host says so. Moves are applied
//! optimistically on the sender's side and never rolled back, which
//! requires a reliable, ordered transport.

use crate::error::CoordinatorError;
use crate::gate::{Secret, SessionGate};
use crate::handlers::HandlerRegistry;
use crate::presentation::Presentation;
use crate::protocol::{Message, MessageKind, Outcome, PeerId};
use crate::transport::{Inbound, TransportLink};
use std::collections::HashMap;
use tictaclink_game::{Authority, Board, DiagonalPolicy, Game, GameResult, Move, Player};
use tracing::{debug, info, instrument, warn};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum Phase {
    /// Not hosting, not joined.
    #[default]
    Idle,
    /// Hosting without an opponent, or joined and waiting for the host.
    WaitingForPeer,
    /// Both peers connected and moves are accepted.
    InProgress,
    /// The game has a result; only restart or leave apply.
    Finished,
}

/// Coordinates one session between a host and a client.
///
/// `P` is the presentation notified on every state change, `L` the link
/// type used to reach the other peer.
pub struct GameCoordinator<P, L> {
    presentation: P,
    policy: DiagonalPolicy,
    phase: Phase,
    role: Option<Player>,
    gate: SessionGate,
    peer: Option<(PeerId, L)>,
    pending: HashMap<PeerId, L>,
    peer_count: usize,
    game: Option<Game>,
    awaiting_turn: bool,
    handlers: Option<HandlerRegistry<P, L>>,
}

impl<P, L> std::fmt::Debug for GameCoordinator<P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameCoordinator")
            .field("phase", &self.phase)
            .field("role", &self.role)
            .field("peer", &self.peer.as_ref().map(|(id, _)| *id))
            .field("peer_count", &self.peer_count)
            .field("awaiting_turn", &self.awaiting_turn)
            .field("game", &self.game)
            .finish()
    }
}

impl<P: Presentation, L: TransportLink> GameCoordinator<P, L> {
    /// Creates an idle coordinator.
    pub fn new(presentation: P, policy: DiagonalPolicy) -> Self {
        Self {
            presentation,
            policy,
            phase: Phase::Idle,
            role: None,
            gate: SessionGate::new(),
            peer: None,
            pending: HashMap::new(),
            peer_count: 0,
            game: None,
            awaiting_turn: false,
            handlers: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Local role, once hosting or joined.
    pub fn role(&self) -> Option<Player> {
        self.role
    }

    /// Peers in the session, counting this one.
    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    /// Id of the admitted peer.
    pub fn peer(&self) -> Option<PeerId> {
        self.peer.as_ref().map(|(id, _)| *id)
    }

    /// Active game, finished or not.
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Board of the active game.
    pub fn board(&self) -> Option<&Board> {
        self.game.as_ref().map(Game::board)
    }

    /// Whose turn it is according to the local turn state.
    pub fn current_turn(&self) -> Option<Player> {
        self.game.as_ref().map(|game| game.turn().current())
    }

    /// Result of the active game.
    pub fn result(&self) -> Option<GameResult> {
        self.game.as_ref().map(Game::result)
    }

    /// Client only: a move was sent and the host has not yet confirmed
    /// the next turn.
    pub fn is_awaiting_turn(&self) -> bool {
        self.awaiting_turn
    }

    /// Join gate. Armed only while hosting.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Presentation collaborator.
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Presentation collaborator, mutably.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Starts hosting behind `secret`.
    #[instrument(skip_all, fields(phase = %self.phase))]
    pub fn start_host(&mut self, secret: impl Into<Secret>) -> Result<(), CoordinatorError> {
        self.ensure_idle()?;
        self.gate.set_secret(secret);
        self.role = Some(Player::Host);
        self.handlers = Some(HandlerRegistry::host());
        self.peer_count = 1;
        self.phase = Phase::WaitingForPeer;
        info!("Hosting, waiting for a peer");
        Ok(())
    }

    /// Joins a host over `link`, presenting `secret`.
    ///
    /// The answer arrives later as either `GameStarted` or `JoinRejected`.
    #[instrument(skip_all, fields(phase = %self.phase))]
    pub fn start_client(
        &mut self,
        secret: impl Into<Secret>,
        mut link: L,
    ) -> Result<(), CoordinatorError> {
        self.ensure_idle()?;
        link.send(Message::JoinRequest {
            secret: secret.into(),
        })?;
        self.role = Some(Player::Client);
        self.handlers = Some(HandlerRegistry::client());
        self.peer = Some((PeerId::HOST, link));
        self.peer_count = 1;
        self.phase = Phase::WaitingForPeer;
        info!("Join request sent");
        Ok(())
    }

    /// Feeds one transport event into the coordinator.
    #[instrument(skip_all, fields(role = ?self.role, phase = %self.phase))]
    pub fn dispatch(&mut self, inbound: Inbound<L>) -> Result<(), CoordinatorError> {
        match inbound {
            Inbound::Connected { peer, link } => {
                self.on_connected(peer, link);
                Ok(())
            }
            Inbound::Message { peer, message } => self.on_message(peer, message),
            Inbound::Disconnected { peer } => {
                self.on_disconnected(peer);
                Ok(())
            }
        }
    }

    /// Places the local player's mark at `(row, col)`.
    ///
    /// Rejections leave every piece of state untouched and send nothing.
    /// If the move cannot be delivered the peer is treated as gone: the
    /// session drops to [`Phase::WaitingForPeer`] (host) or
    /// [`Phase::Idle`] (client) and the transport error is returned.
    #[instrument(skip(self), fields(role = ?self.role, phase = %self.phase))]
    pub fn request_move(&mut self, row: usize, col: usize) -> Result<(), CoordinatorError> {
        if self.phase != Phase::InProgress {
            return Err(CoordinatorError::NotInProgress(self.phase));
        }
        let local = self.role.ok_or(CoordinatorError::NotInProgress(self.phase))?;
        let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;

        if let Err(e) = game.validate(row, col, local) {
            warn!(row, col, error = %e, "Move rejected");
            return Err(e.into());
        }
        if self.awaiting_turn {
            warn!(row, col, "Move rejected, turn not yet confirmed by host");
            return Err(CoordinatorError::NotYourTurn(local));
        }

        let result = game.apply(Move::new(row, col, local))?;
        self.presentation.on_cell_marked(row, col, local);
        self.send(Message::MoveApplied { row, col })?;
        self.after_move(result, true)
    }

    /// Applies the opponent's move reported by `MoveApplied`.
    ///
    /// Turn ownership is not re-checked; the sender already did.
    #[instrument(skip(self), fields(role = ?self.role, phase = %self.phase))]
    pub fn on_remote_move(&mut self, row: usize, col: usize) -> Result<(), CoordinatorError> {
        if self.phase != Phase::InProgress {
            warn!(row, col, "Remote move outside a running game");
            return Err(CoordinatorError::NotInProgress(self.phase));
        }
        let remote = self
            .role
            .ok_or(CoordinatorError::NotInProgress(self.phase))?
            .opponent();
        let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;
        let result = game
            .apply(Move::new(row, col, remote))
            .inspect_err(|e| warn!(row, col, error = %e, "Remote move refused"))?;
        self.presentation.on_cell_marked(row, col, remote);
        self.after_move(result, false)
    }

    /// Host only: admits or rejects the connection `peer`.
    #[instrument(skip(self, secret))]
    pub fn on_join_request(&mut self, peer: PeerId, secret: &Secret) -> Result<(), CoordinatorError> {
        let mut link = self
            .pending
            .remove(&peer)
            .ok_or(CoordinatorError::UnknownPeer(peer))?;

        let full = self.peer.is_some() || self.phase != Phase::WaitingForPeer;
        if full || !self.gate.approve(secret) {
            warn!(full, "Join rejected");
            if let Err(e) = link.send(Message::JoinRejected) {
                debug!(error = %e, "Could not deliver rejection");
            }
            link.shutdown();
            return Err(CoordinatorError::JoinRejected);
        }

        info!("Peer admitted");
        self.peer = Some((peer, link));
        self.on_peer_joined(peer)
    }

    /// Host only: an admitted peer completes the session and starts a game.
    ///
    /// Only reachable through an approved `JoinRequest` while waiting.
    #[instrument(skip(self))]
    fn on_peer_joined(&mut self, peer: PeerId) -> Result<(), CoordinatorError> {
        if self.phase != Phase::WaitingForPeer || self.peer_count != 1 {
            warn!(
                phase = %self.phase,
                peer_count = self.peer_count,
                "Peer joined outside the waiting phase"
            );
            return Err(CoordinatorError::AlreadyInSession(self.phase));
        }
        self.peer_count = 2;
        self.game = Some(Game::new(Authority::Authoritative, self.policy));
        self.phase = Phase::InProgress;
        info!(peer_count = self.peer_count, "Game started");
        self.presentation.on_game_started();
        self.send(Message::GameStarted)
    }

    /// Client only: the host refused us.
    #[instrument(skip(self))]
    pub fn on_join_rejected(&mut self) -> Result<(), CoordinatorError> {
        if let Some((_, mut link)) = self.peer.take() {
            link.shutdown();
        }
        self.reset_to_idle();
        warn!("Join rejected by host");
        self.presentation.on_join_rejected();
        Err(CoordinatorError::JoinRejected)
    }

    /// Client only: the host admitted us and created a game.
    #[instrument(skip(self))]
    pub fn on_game_started(&mut self) -> Result<(), CoordinatorError> {
        if self.phase != Phase::WaitingForPeer {
            warn!(phase = %self.phase, "GameStarted while not waiting");
        }
        self.game = Some(Game::new(Authority::Replica, self.policy));
        self.peer_count = 2;
        self.awaiting_turn = false;
        self.phase = Phase::InProgress;
        info!("Game started");
        self.presentation.on_game_started();
        Ok(())
    }

    /// Client only: the host says whose turn it is.
    #[instrument(skip(self))]
    pub fn on_turn_confirmed(&mut self, turn: Player) -> Result<(), CoordinatorError> {
        let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;
        game.confirm_turn(turn)?;
        self.awaiting_turn = false;
        debug!("Turn confirmed");
        Ok(())
    }

    /// The peer that detected the end of the game sent our half.
    #[instrument(skip(self))]
    pub fn on_result_notified(&mut self, outcome: Outcome) -> Result<(), CoordinatorError> {
        let local = self.role.ok_or(CoordinatorError::NoActiveGame)?;
        let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;
        if !game.result().is_terminal() {
            game.conclude(outcome.to_result(local));
        }
        self.phase = Phase::Finished;
        self.presentation.on_result(outcome);
        Ok(())
    }

    /// Starts a fresh game in the same session.
    ///
    /// The host restarts directly; the client asks the host to.
    #[instrument(skip(self), fields(role = ?self.role, phase = %self.phase))]
    pub fn request_restart(&mut self) -> Result<(), CoordinatorError> {
        self.ensure_game_phase()?;
        match self.role {
            Some(Player::Host) => self.restart_as_host(),
            Some(Player::Client) => {
                info!("Asking host to restart");
                self.send(Message::RestartRequest)
            }
            None => Err(CoordinatorError::NoActiveGame),
        }
    }

    /// Host only: recreates the game and tells the client.
    #[instrument(skip(self))]
    pub fn restart_as_host(&mut self) -> Result<(), CoordinatorError> {
        self.ensure_game_phase()?;
        self.reset_game()?;
        self.send(Message::RestartApplied)
    }

    /// Client only: the host restarted the game.
    #[instrument(skip(self))]
    pub fn on_restart_applied(&mut self) -> Result<(), CoordinatorError> {
        self.ensure_game_phase()?;
        self.reset_game()
    }

    /// Ends the session from this side.
    ///
    /// The local presentation initiated this, so it is not told the peer
    /// left.
    #[instrument(skip(self), fields(role = ?self.role, phase = %self.phase))]
    pub fn leave(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }
        if self.role == Some(Player::Host) {
            self.gate.clear();
        }
        if let Some((_, mut link)) = self.peer.take() {
            link.shutdown();
        }
        for (_, mut link) in self.pending.drain() {
            link.shutdown();
        }
        self.reset_to_idle();
        info!("Left session");
    }

    /// The admitted peer went away.
    ///
    /// The host keeps hosting; the client is done.
    #[instrument(skip(self), fields(role = ?self.role))]
    pub fn on_peer_left(&mut self, peer: PeerId) {
        if let Some((_, mut link)) = self.peer.take() {
            link.shutdown();
        }
        match self.role {
            Some(Player::Host) => {
                self.game = None;
                self.awaiting_turn = false;
                self.peer_count = 1;
                self.phase = Phase::WaitingForPeer;
            }
            Some(Player::Client) => self.reset_to_idle(),
            None => return,
        }
        info!("Peer left");
        self.presentation.on_peer_left();
    }

    fn on_connected(&mut self, peer: PeerId, mut link: L) {
        if self.role != Some(Player::Host) {
            warn!(%peer, "Connection while not hosting");
            link.shutdown();
            return;
        }
        debug!(%peer, "Connection pending admission");
        self.pending.insert(peer, link);
    }

    fn on_message(&mut self, peer: PeerId, message: Message) -> Result<(), CoordinatorError> {
        let kind = message.kind();
        let handler = self
            .handlers
            .as_ref()
            .and_then(|handlers| handlers.get(kind))
            .ok_or(CoordinatorError::UnexpectedMessage {
                kind,
                role: self.role,
            })?;

        let admitted = self.peer().is_some_and(|id| id == peer);
        let joining = kind == MessageKind::JoinRequest && self.pending.contains_key(&peer);
        if !admitted && !joining {
            warn!(%peer, %kind, "Message from a peer that was never admitted");
            return Err(CoordinatorError::UnknownPeer(peer));
        }

        debug!(%peer, %kind, "Dispatching");
        handler(self, peer, message)
    }

    fn on_disconnected(&mut self, peer: PeerId) {
        if self.pending.remove(&peer).is_some() {
            debug!(%peer, "Pending connection dropped");
            return;
        }
        if self.peer().is_some_and(|id| id == peer) {
            self.on_peer_left(peer);
        }
    }

    fn after_move(&mut self, result: GameResult, local_move: bool) -> Result<(), CoordinatorError> {
        if result.is_terminal() {
            self.phase = Phase::Finished;
            info!(%result, "Game finished");
            if local_move {
                self.notify_result(result)?;
            }
            return Ok(());
        }

        match self.role {
            Some(Player::Host) => {
                let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;
                let turn = game.advance_turn()?;
                self.send(Message::TurnSync { turn })?;
            }
            Some(Player::Client) if local_move => self.awaiting_turn = true,
            _ => {}
        }
        Ok(())
    }

    fn notify_result(&mut self, result: GameResult) -> Result<(), CoordinatorError> {
        let local = self.role.ok_or(CoordinatorError::NoActiveGame)?;
        let Some(outcome) = Outcome::for_player(result, local) else {
            return Ok(());
        };
        self.presentation.on_result(outcome);
        self.send(Message::ResultNotify {
            outcome: outcome.complement(),
        })
    }

    fn reset_game(&mut self) -> Result<(), CoordinatorError> {
        let game = self.game.as_mut().ok_or(CoordinatorError::NoActiveGame)?;
        game.restart();
        self.awaiting_turn = false;
        self.phase = Phase::InProgress;
        info!("Game restarted");
        self.presentation.on_restarted();
        Ok(())
    }

    fn reset_to_idle(&mut self) {
        self.role = None;
        self.handlers = None;
        self.game = None;
        self.peer_count = 0;
        self.awaiting_turn = false;
        self.phase = Phase::Idle;
    }

    fn ensure_idle(&self) -> Result<(), CoordinatorError> {
        match self.phase {
            Phase::Idle => Ok(()),
            phase => Err(CoordinatorError::AlreadyInSession(phase)),
        }
    }

    fn ensure_game_phase(&self) -> Result<(), CoordinatorError> {
        match self.phase {
            Phase::InProgress | Phase::Finished if self.game.is_some() => Ok(()),
            _ => Err(CoordinatorError::NoActiveGame),
        }
    }

    /// Sends to the admitted peer. A failed send ends the peer's session.
    fn send(&mut self, message: Message) -> Result<(), CoordinatorError> {
        let (peer, link) = self.peer.as_mut().ok_or(CoordinatorError::NotConnected)?;
        let peer = *peer;
        let kind = message.kind();
        debug!(%peer, %kind, "Sending");
        if let Err(e) = link.send(message) {
            warn!(%peer, %kind, error = %e, "Send failed, dropping peer");
            self.on_peer_left(peer);
            return Err(e.into());
        }
        Ok(())
    }
}
