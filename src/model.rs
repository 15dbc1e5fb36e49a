//! Persisted entity shapes
//!
//! Messages, groups and profiles are owned by the external store; the relay
//! only reads and updates them through `Store`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::delivery::MessageStatus;
use crate::types::{GroupId, Identity, MessageId};

/// Who a message is addressed to
///
/// Exactly one target per message, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum MessageTarget {
    Direct { receiver_id: Identity },
    Group { group_id: GroupId },
}

impl MessageTarget {
    pub fn direct(receiver_id: Identity) -> Self {
        Self::Direct { receiver_id }
    }

    pub fn group(group_id: GroupId) -> Self {
        Self::Group { group_id }
    }
}

/// Message body: optional text plus optional media reference
///
/// The media reference is an opaque string from the media store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContent {
    pub text: Option<String>,
    pub media: Option<String>,
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media: None,
        }
    }

    pub fn media(reference: impl Into<String>) -> Self {
        Self {
            text: None,
            media: Some(reference.into()),
        }
    }

    /// Trim text and drop blank parts
    pub fn normalized(self) -> Self {
        let text = self
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let media = self.media.filter(|m| !m.trim().is_empty());
        Self { text, media }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.media.is_none()
    }
}

/// One identity's reaction to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: Identity,
}

/// Persisted chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: Identity,
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: MessageStatus,
    pub reactions: Vec<Reaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Build a fresh `sent` message stamped with the current time
    pub fn new(sender_id: Identity, target: MessageTarget, content: MessageContent) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            target,
            text: content.text,
            media: content.media,
            created_at: Utc::now(),
            status: MessageStatus::Sent,
            reactions: Vec::new(),
            seen_at: None,
        }
    }

    /// True if the message belongs to the conversation between `a` and `b`
    pub fn is_between(&self, a: &Identity, b: &Identity) -> bool {
        match &self.target {
            MessageTarget::Direct { receiver_id } => {
                (&self.sender_id == a && receiver_id == b)
                    || (&self.sender_id == b && receiver_id == a)
            }
            MessageTarget::Group { .. } => false,
        }
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        match &self.target {
            MessageTarget::Group { group_id } => Some(group_id),
            MessageTarget::Direct { .. } => None,
        }
    }
}

/// Persisted group: member set plus one admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Identity>,
    pub admin: Identity,
}

impl Group {
    pub fn is_member(&self, identity: &Identity) -> bool {
        self.members.contains(identity)
    }
}

/// User profile as held by the identity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub identity: Identity,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// Minimal sender fields attached to a pushed message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderProfile {
    pub id: Identity,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<UserProfile> for SenderProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.identity,
            display_name: profile.display_name,
            avatar: profile.avatar,
        }
    }
}

/// Message plus sender profile, as pushed to live targets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender: SenderProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    #[test]
    fn test_content_normalized() {
        let content = MessageContent {
            text: Some("  hello  ".to_string()),
            media: Some(" ".to_string()),
        }
        .normalized();
        assert_eq!(content.text.as_deref(), Some("hello"));
        assert!(content.media.is_none());

        assert!(MessageContent::text("   ").normalized().is_empty());
    }

    #[test]
    fn test_new_message_is_sent() {
        let msg = Message::new(id("a"), MessageTarget::direct(id("b")), MessageContent::text("x"));
        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(msg.reactions.is_empty());
        assert!(msg.seen_at.is_none());
    }

    #[test]
    fn test_is_between() {
        let msg = Message::new(id("a"), MessageTarget::direct(id("b")), MessageContent::text("x"));
        assert!(msg.is_between(&id("a"), &id("b")));
        assert!(msg.is_between(&id("b"), &id("a")));
        assert!(!msg.is_between(&id("a"), &id("c")));
    }

    #[test]
    fn test_message_serialize_target() {
        let direct = Message::new(id("a"), MessageTarget::direct(id("b")), MessageContent::text("x"));
        let json = serde_json::to_string(&direct).unwrap();
        assert!(json.contains("\"senderId\":\"a\""));
        assert!(json.contains("\"receiverId\":\"b\""));
        assert!(!json.contains("groupId"));
        assert!(json.contains("\"status\":\"sent\""));

        let group = Message::new(
            id("a"),
            MessageTarget::group(GroupId::new("g1")),
            MessageContent::media("media://1"),
        );
        let json = serde_json::to_string(&group).unwrap();
        assert!(json.contains("\"groupId\":\"g1\""));
        assert!(json.contains("\"media\":\"media://1\""));
        assert!(!json.contains("receiverId"));
        assert!(!json.contains("\"text\""));
    }
}
