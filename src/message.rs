//! Message protocol definitions
//!
//! JSON-based bidirectional event protocol using Serde's tagged enum.
//! Event names are snake_case except for the camelCase events inherited
//! from the chat clients (`getOnlineUsers`, `newMessage`, ...). Payload
//! fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::delivery::MessageStatus;
use crate::model::{Group, HydratedMessage};
use crate::types::{ConnectionId, GroupId, Identity, MessageId};

/// Client → Relay event
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Started typing in a direct chat
    Typing { to_user_id: Identity },
    /// Stopped typing in a direct chat
    StopTyping { to_user_id: Identity },
    /// Started typing in a group room
    GroupTyping { group_id: GroupId },
    /// Stopped typing in a group room
    GroupStopTyping { group_id: GroupId },
    /// Subscribe to a group room
    JoinGroup { group_id: GroupId },
    /// Unsubscribe from a group room
    LeaveGroup { group_id: GroupId },
    /// Receipt notice for a direct message (accepted, no state change)
    MessageDelivered { message_id: MessageId },
    /// Receipt notice for a group message (accepted, no state change)
    GroupMessageDelivered {
        message_id: MessageId,
        group_id: GroupId,
    },
}

/// Relay → Client event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Handshake accepted
    Connected {
        connection_id: ConnectionId,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<Identity>,
    },
    /// Full presence roster, sent to every connection on change
    #[serde(rename = "getOnlineUsers")]
    GetOnlineUsers { users: Vec<Identity> },
    /// Peer started typing
    Typing { from_user_id: Identity },
    /// Peer stopped typing
    StopTyping { from_user_id: Identity },
    /// Room peer started typing
    GroupTyping {
        from_user_id: Identity,
        group_id: GroupId,
    },
    /// Room peer stopped typing
    GroupStopTyping {
        from_user_id: Identity,
        group_id: GroupId,
    },
    /// Direct message for the recipient
    #[serde(rename = "newMessage")]
    NewMessage { message: HydratedMessage },
    /// Group message for room subscribers
    #[serde(rename = "newGroupMessage")]
    NewGroupMessage { message: HydratedMessage },
    /// Status change of a message, for its sender
    MessageStatusUpdate {
        message_id: MessageId,
        status: MessageStatus,
    },
    /// Group details changed
    #[serde(rename = "groupUpdated")]
    GroupUpdated { group: Group },
    /// Group was deleted
    #[serde(rename = "groupDeleted")]
    GroupDeleted { group_id: GroupId },
    /// A member left the group
    #[serde(rename = "memberLeft")]
    MemberLeft { group_id: GroupId, user_id: Identity },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize() {
        let json = r#"{"type": "typing", "toUserId": "alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Typing { to_user_id } => assert_eq!(to_user_id.as_str(), "alice"),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_join_group_deserialize() {
        let json = r#"{"type": "join_group", "groupId": "g42"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::JoinGroup { group_id } => assert_eq!(group_id, GroupId::new("g42")),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_blank_target_rejected() {
        let json = r#"{"type": "typing", "toUserId": "  "}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_roster_serialize() {
        let msg = ServerMessage::GetOnlineUsers {
            users: vec![Identity::parse("bob").unwrap()],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"getOnlineUsers\""));
        assert!(json.contains("\"users\":[\"bob\"]"));
    }

    #[test]
    fn test_group_typing_serialize() {
        let msg = ServerMessage::GroupTyping {
            from_user_id: Identity::parse("alice").unwrap(),
            group_id: GroupId::new("g1"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"group_typing\""));
        assert!(json.contains("\"fromUserId\":\"alice\""));
        assert!(json.contains("\"groupId\":\"g1\""));
    }

    #[test]
    fn test_status_update_serialize() {
        let msg = ServerMessage::MessageStatusUpdate {
            message_id: MessageId::new(),
            status: MessageStatus::Read,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"message_status_update\""));
        assert!(json.contains("\"status\":\"read\""));
        assert!(json.contains("\"messageId\""));
    }
}
