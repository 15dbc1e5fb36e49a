//! Connection struct definition
//!
//! Represents one live transport session and its outbound event queue.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ConnectionId, Identity};

/// Live connection state held by the relay
///
/// `identity` is None for connections that opened without a valid
/// identity; they still receive broadcasts but are never in presence.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Identity supplied at handshake
    pub identity: Option<Identity>,
    /// Relay → Client event queue
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        identity: Option<Identity>,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            identity,
            sender,
        }
    }

    /// Queue an event for this connection without waiting
    ///
    /// Fails if the writer task is gone or the queue is full.
    pub fn push(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}
