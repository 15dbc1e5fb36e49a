//! Error types for the relay
//!
//! Defines application-level errors, store collaborator errors and
//! per-connection push errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::delivery::MessageStatus;
use crate::types::{GroupId, MessageId};

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors returned to the caller of a dispatcher operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay actor is gone (internal channel broken)
    #[error("Relay closed")]
    RelayClosed,

    /// Persisted-store collaborator failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No message with the given id
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// No group with the given id
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// Caller is not the addressed recipient of a direct message
    #[error("Only the recipient may mark this message as read")]
    NotRecipient,

    /// Caller is not a persisted member of the group
    #[error("Not a member of group {0}")]
    NotGroupMember(GroupId),

    /// Group messages carry no per-recipient read state
    #[error("Read state is not tracked for group messages")]
    GroupReadUntracked,

    /// Requested status change has no transition
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    /// Message carries neither text nor media
    #[error("Message must contain either text or media")]
    EmptyMessage,

    /// Reaction emoji is blank
    #[error("Reaction emoji is required")]
    EmptyEmoji,

    /// Identity is blank
    #[error("Invalid identity")]
    InvalidIdentity,
}

/// Persisted-store errors
///
/// Raised by `Store` implementations; opaque to the relay.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record to update does not exist
    #[error("Record not found")]
    Missing,

    /// Backend failure (network, driver, ...)
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Message push errors
///
/// Occurs when a connection's outbound queue cannot take an event.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    Closed,

    /// The connection is not draining its queue
    #[error("Channel full")]
    Full,
}
