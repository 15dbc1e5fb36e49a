//! RelayServer actor implementation
//!
//! The single owner of live state: connections, the presence registry and
//! room subscriptions. Handlers and the dispatcher talk to it over an mpsc
//! channel, so every registry and membership access is serialized here.
//! Nothing in this actor awaits a store call.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::connection::Connection;
use crate::membership::ChannelMembership;
use crate::message::ServerMessage;
use crate::presence::PresenceRegistry;
use crate::signaling::{self, TypingSignal};
use crate::types::{ConnectionId, GroupId, Identity, MessageId};

/// Commands sent to the RelayServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection opened
    Connect {
        connection_id: ConnectionId,
        identity: Option<Identity>,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Connection closed
    Disconnect { connection_id: ConnectionId },
    /// Subscribe to a group room
    JoinGroup {
        connection_id: ConnectionId,
        group_id: GroupId,
    },
    /// Unsubscribe from a group room
    LeaveGroup {
        connection_id: ConnectionId,
        group_id: GroupId,
    },
    /// Typing signal for a direct chat
    DirectTyping {
        connection_id: ConnectionId,
        to: Identity,
        signal: TypingSignal,
    },
    /// Typing signal for a group room
    GroupTyping {
        connection_id: ConnectionId,
        group_id: GroupId,
        signal: TypingSignal,
    },
    /// Client receipt notice; accepted without a state change
    Delivered {
        connection_id: ConnectionId,
        message_id: MessageId,
    },
    /// Push an event to whichever connection holds `identity`
    PushToIdentity {
        identity: Identity,
        event: ServerMessage,
    },
    /// Push an event to every subscriber of a room
    PushToRoom {
        group_id: GroupId,
        event: ServerMessage,
    },
    /// Read the presence roster
    Roster { reply: oneshot::Sender<Vec<Identity>> },
}

/// The relay actor
///
/// Uses HashMap for O(1) lookups on connections; presence and room
/// subscriptions live in their own structures.
pub struct RelayServer {
    /// All open connections: ConnectionId -> Connection
    connections: HashMap<ConnectionId, Connection>,
    /// Identity -> ConnectionId
    presence: PresenceRegistry,
    /// Room subscriptions
    membership: ChannelMembership,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl RelayServer {
    /// Create a new RelayServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            connections: HashMap::new(),
            presence: PresenceRegistry::new(),
            membership: ChannelMembership::new(),
            receiver,
        }
    }

    /// Run the relay event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("RelayServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("RelayServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                connection_id,
                identity,
                sender,
            } => {
                self.handle_connect(connection_id, identity, sender);
            }
            ServerCommand::Disconnect { connection_id } => {
                self.handle_disconnect(connection_id);
            }
            ServerCommand::JoinGroup {
                connection_id,
                group_id,
            } => {
                if self.connections.contains_key(&connection_id) {
                    debug!("Connection {} joined room {}", connection_id, group_id);
                    self.membership.join(connection_id, group_id);
                }
            }
            ServerCommand::LeaveGroup {
                connection_id,
                group_id,
            } => {
                if self.membership.leave(connection_id, &group_id) {
                    debug!("Connection {} left room {}", connection_id, group_id);
                }
            }
            ServerCommand::DirectTyping {
                connection_id,
                to,
                signal,
            } => {
                self.handle_direct_typing(connection_id, to, signal);
            }
            ServerCommand::GroupTyping {
                connection_id,
                group_id,
                signal,
            } => {
                self.handle_group_typing(connection_id, group_id, signal);
            }
            ServerCommand::Delivered {
                connection_id,
                message_id,
            } => {
                debug!(
                    "Delivery notice for {} from {} (no transition)",
                    message_id, connection_id
                );
            }
            ServerCommand::PushToIdentity { identity, event } => {
                self.push_to_identity(&identity, event);
            }
            ServerCommand::PushToRoom { group_id, event } => {
                let targets = self.membership.subscribers(&group_id);
                debug!("Fan-out to room {}: {} subscriber(s)", group_id, targets.len());
                for connection_id in targets {
                    self.push(connection_id, event.clone());
                }
            }
            ServerCommand::Roster { reply } => {
                let _ = reply.send(self.presence.roster());
            }
        }
    }

    /// Handle new connection
    fn handle_connect(
        &mut self,
        connection_id: ConnectionId,
        identity: Option<Identity>,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        match &identity {
            Some(identity) => {
                info!("Connection {} opened for {}", connection_id, identity);
                if let Some(previous) = self.presence.register(identity.clone(), connection_id) {
                    debug!(
                        "Connection {} superseded by {} for {}",
                        previous, connection_id, identity
                    );
                }
            }
            None => {
                info!("Connection {} opened without identity", connection_id);
            }
        }

        self.connections
            .insert(connection_id, Connection::new(connection_id, identity, sender));
        self.broadcast_roster();

        debug!(
            "Total connections: {}, Online: {}, Rooms: {}",
            self.connections.len(),
            self.presence.len(),
            self.membership.room_count()
        );
    }

    /// Handle connection close
    fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        let left = self.membership.leave_all(connection_id);
        if !left.is_empty() {
            debug!("Connection {} left {} room(s)", connection_id, left.len());
        }

        self.connections.remove(&connection_id);

        if let Some(identity) = self.presence.unregister(connection_id) {
            info!("{} went offline", identity);
            self.broadcast_roster();
        }

        debug!(
            "Total connections: {}, Online: {}, Rooms: {}",
            self.connections.len(),
            self.presence.len(),
            self.membership.room_count()
        );
    }

    /// Relay a typing signal to one peer
    fn handle_direct_typing(
        &mut self,
        connection_id: ConnectionId,
        to: Identity,
        signal: TypingSignal,
    ) {
        let Some(from) = self.identity_of(connection_id) else {
            return;
        };

        let Some(target) = signaling::direct_target(&self.presence, &to) else {
            debug!("Typing signal for offline {} dropped", to);
            return;
        };

        self.push(target, signal.direct_event(from));
    }

    /// Relay a typing signal to the other subscribers of a room
    fn handle_group_typing(
        &mut self,
        connection_id: ConnectionId,
        group_id: GroupId,
        signal: TypingSignal,
    ) {
        let Some(from) = self.identity_of(connection_id) else {
            return;
        };

        for target in signaling::group_targets(&self.membership, &group_id, connection_id) {
            self.push(target, signal.group_event(from.clone(), group_id.clone()));
        }
    }

    /// Helper: Identity attached to a connection, if any
    fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        self.connections
            .get(&connection_id)
            .and_then(|c| c.identity.clone())
    }

    /// Helper: Push to the live connection of an identity, dropping if offline
    fn push_to_identity(&self, identity: &Identity, event: ServerMessage) {
        match self.presence.lookup(identity) {
            Some(connection_id) => self.push(connection_id, event),
            None => debug!("{} offline, push dropped", identity),
        }
    }

    /// Helper: Fire-and-forget push to one connection
    fn push(&self, connection_id: ConnectionId, event: ServerMessage) {
        let Some(connection) = self.connections.get(&connection_id) else {
            return;
        };

        if let Err(e) = connection.push(event) {
            debug!("Push to {} dropped: {}", connection_id, e);
        }
    }

    /// Helper: Send the current roster to every connection
    fn broadcast_roster(&self) {
        let users = self.presence.roster();
        for connection in self.connections.values() {
            if let Err(e) = connection.push(ServerMessage::GetOnlineUsers {
                users: users.clone(),
            }) {
                debug!("Roster push to {} dropped: {}", connection.id, e);
            }
        }
    }
}
