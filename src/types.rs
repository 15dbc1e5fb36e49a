//! Basic type definitions for the relay
//!
//! Provides newtype wrappers for type safety:
//! - `Identity`: user identity issued by the session service
//! - `ConnectionId`: UUID-based identifier of one live connection
//! - `MessageId`: UUID-based identifier of a persisted message
//! - `GroupId`: group identifier, doubling as the room key

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Stable user identity (newtype pattern)
///
/// Validated once when it enters the relay and used verbatim as the
/// presence key: empty or whitespace-padded values are rejected, never
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse an identity, rejecting blank or padded input
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty() || raw.trim() != raw {
            return Err(AppError::InvalidIdentity);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. One is minted per accepted WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group identifier
///
/// Handed out by the HTTP layer; the relay uses it verbatim as a room key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_identity_padded_rejected() {
        assert_eq!(Identity::parse("alice").unwrap().as_str(), "alice");
        assert!(matches!(Identity::parse(" alice"), Err(AppError::InvalidIdentity)));
        assert!(matches!(Identity::parse("alice\n"), Err(AppError::InvalidIdentity)));
        assert_ne!(Identity::parse("a").ok(), Identity::parse(" a").ok());
    }

    #[test]
    fn test_identity_rejects_blank() {
        assert!(matches!(Identity::parse(""), Err(AppError::InvalidIdentity)));
        assert!(matches!(Identity::parse("   "), Err(AppError::InvalidIdentity)));
    }

    #[test]
    fn test_identity_serde() {
        let identity: Identity = serde_json::from_str(r#""bob""#).unwrap();
        assert_eq!(identity.as_str(), "bob");
        assert_eq!(serde_json::to_string(&identity).unwrap(), r#""bob""#);
        assert!(serde_json::from_str::<Identity>(r#""""#).is_err());
    }
}
