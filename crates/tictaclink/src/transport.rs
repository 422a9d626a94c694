//! Transport seam between the coordinator and whatever carries messages.
//!
//! The coordinator only ever sends through a [`TransportLink`]. Everything
//! it receives arrives as an [`Inbound`] event from the process's receive
//! loop. Delivery is assumed reliable and ordered.

use crate::protocol::{Message, PeerId};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Error raised when a message cannot be handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TransportError {
    /// The link was shut down or the far end went away.
    #[display("Transport link is closed")]
    Closed,
}

impl std::error::Error for TransportError {}

/// Outbound half of a connection to one peer.
pub trait TransportLink {
    /// Queues `message` for delivery to the peer.
    fn send(&mut self, message: Message) -> Result<(), TransportError>;

    /// Closes the link. Later sends fail with [`TransportError::Closed`].
    fn shutdown(&mut self);
}

/// Event delivered to the coordinator by a receive loop.
#[derive(Debug)]
pub enum Inbound<L> {
    /// A connection was opened; the peer has not been admitted yet.
    Connected {
        /// Local id of the connection.
        peer: PeerId,
        /// Link used to answer the peer.
        link: L,
    },
    /// The peer sent a message.
    Message {
        /// Sender.
        peer: PeerId,
        /// Decoded message.
        message: Message,
    },
    /// The connection dropped.
    Disconnected {
        /// Peer that went away.
        peer: PeerId,
    },
}

/// Link backed by an unbounded tokio channel.
///
/// The receiving end is drained by a socket writer task, or read directly
/// by tests.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: Option<mpsc::UnboundedSender<Message>>,
}

impl ChannelLink {
    /// Creates a link and the receiver its messages arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Returns `true` until the link is shut down.
    pub fn is_open(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl TransportLink for ChannelLink {
    #[instrument(skip(self), fields(kind = %message.kind()))]
    fn send(&mut self, message: Message) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(message).map_err(|_| TransportError::Closed)?;
        debug!("Message queued");
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.tx.take().is_some() {
            debug!("Link shut down");
        }
    }
}
