//! Ephemeral typing signals
//!
//! Stateless: resolves where a typing signal goes and what the receiver
//! sees. No timers; clients decide when to send `stop_typing`.

use crate::membership::ChannelMembership;
use crate::message::ServerMessage;
use crate::presence::PresenceRegistry;
use crate::types::{ConnectionId, GroupId, Identity};

/// Typing state carried by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Started,
    Stopped,
}

impl TypingSignal {
    /// Event delivered to a direct-chat peer
    pub fn direct_event(self, from: Identity) -> ServerMessage {
        match self {
            TypingSignal::Started => ServerMessage::Typing { from_user_id: from },
            TypingSignal::Stopped => ServerMessage::StopTyping { from_user_id: from },
        }
    }

    /// Event delivered to room peers
    pub fn group_event(self, from: Identity, group_id: GroupId) -> ServerMessage {
        match self {
            TypingSignal::Started => ServerMessage::GroupTyping {
                from_user_id: from,
                group_id,
            },
            TypingSignal::Stopped => ServerMessage::GroupStopTyping {
                from_user_id: from,
                group_id,
            },
        }
    }
}

/// Connection a direct signal goes to, if the target is online
pub fn direct_target(registry: &PresenceRegistry, to: &Identity) -> Option<ConnectionId> {
    registry.lookup(to)
}

/// Every room subscriber except the originating connection
pub fn group_targets(
    membership: &ChannelMembership,
    group_id: &GroupId,
    origin: ConnectionId,
) -> Vec<ConnectionId> {
    membership
        .subscribers(group_id)
        .into_iter()
        .filter(|c| *c != origin)
        .collect()
}
