//! Message delivery state machine
//!
//! A message starts `sent` when it is persisted and ends `read`.
//! `delivered` is part of the wire vocabulary but nothing moves a message
//! into it: client delivery notices are accepted and ignored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::model::{Message, MessageTarget};
use crate::types::Identity;

/// Lifecycle status of a persisted message
///
/// Ordered so that a status never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        };
        f.write_str(name)
    }
}

/// Outcome of an accepted status request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status moved forward; persist and notify
    Advanced(MessageStatus),
    /// Already in the requested state
    Unchanged,
}

impl MessageStatus {
    /// Validate a requested status change
    ///
    /// Only `read` can be requested; it is reachable from any earlier state
    /// and idempotent once reached.
    pub fn transition(self, to: MessageStatus) -> Result<Transition, AppError> {
        match (self, to) {
            (MessageStatus::Read, MessageStatus::Read) => Ok(Transition::Unchanged),
            (_, MessageStatus::Read) => Ok(Transition::Advanced(MessageStatus::Read)),
            (from, to) => Err(AppError::InvalidTransition { from, to }),
        }
    }
}

/// Move a message to `read` in place, stamping `seen_at`
///
/// Meant to run on the current stored record, so a status already at
/// `read` is left as is.
pub fn apply_read(message: &mut Message, seen_at: DateTime<Utc>) -> Transition {
    match message.status.transition(MessageStatus::Read) {
        Ok(Transition::Advanced(status)) => {
            message.status = status;
            message.seen_at = Some(seen_at);
            Transition::Advanced(status)
        }
        _ => Transition::Unchanged,
    }
}

/// Check that `caller` owns the read state of `message`
///
/// Direct messages: only the recipient. Group messages have one shared
/// status and are rejected outright.
pub fn authorize_read(message: &Message, caller: &Identity) -> Result<(), AppError> {
    match &message.target {
        MessageTarget::Direct { receiver_id } if receiver_id == caller => Ok(()),
        MessageTarget::Direct { .. } => Err(AppError::NotRecipient),
        MessageTarget::Group { .. } => Err(AppError::GroupReadUntracked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageContent;
    use crate::types::GroupId;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    #[test]
    fn test_sent_to_read_advances() {
        assert_eq!(
            MessageStatus::Sent.transition(MessageStatus::Read).unwrap(),
            Transition::Advanced(MessageStatus::Read)
        );
    }

    #[test]
    fn test_read_is_idempotent() {
        assert_eq!(
            MessageStatus::Read.transition(MessageStatus::Read).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_delivered_unreachable() {
        let err = MessageStatus::Sent
            .transition(MessageStatus::Delivered)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: MessageStatus::Sent,
                to: MessageStatus::Delivered
            }
        ));
    }

    #[test]
    fn test_no_backwards_transition() {
        assert!(MessageStatus::Read.transition(MessageStatus::Sent).is_err());
        assert!(MessageStatus::Sent < MessageStatus::Read);
    }

    #[test]
    fn test_authorize_read() {
        let content = MessageContent::text("hi");
        let direct = Message::new(id("alice"), MessageTarget::direct(id("bob")), content.clone());

        assert!(authorize_read(&direct, &id("bob")).is_ok());
        assert!(matches!(
            authorize_read(&direct, &id("alice")),
            Err(AppError::NotRecipient)
        ));

        let group = Message::new(id("alice"), MessageTarget::group(GroupId::new("g1")), content);
        assert!(matches!(
            authorize_read(&group, &id("bob")),
            Err(AppError::GroupReadUntracked)
        ));
    }

    #[test]
    fn test_apply_read_once() {
        let mut msg = Message::new(
            id("alice"),
            MessageTarget::direct(id("bob")),
            MessageContent::text("hi"),
        );
        let first = Utc::now();

        assert_eq!(
            apply_read(&mut msg, first),
            Transition::Advanced(MessageStatus::Read)
        );
        assert_eq!(msg.status, MessageStatus::Read);
        assert_eq!(msg.seen_at, Some(first));

        assert_eq!(apply_read(&mut msg, Utc::now()), Transition::Unchanged);
        assert_eq!(msg.seen_at, Some(first));
    }

    #[test]
    fn test_status_serialize() {
        assert_eq!(serde_json::to_string(&MessageStatus::Read).unwrap(), r#""read""#);
    }
}
