//! Presence registry
//!
//! Maps each identity to its one live connection. Owned by the relay
//! actor, so no interior locking.

use std::collections::HashMap;

use crate::types::{ConnectionId, Identity};

/// Identity -> connection mapping
///
/// Last write wins: registering an identity that already has a connection
/// orphans the old one.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    connections: HashMap<Identity, ConnectionId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `identity` to `connection_id`, returning the connection it replaced
    pub fn register(
        &mut self,
        identity: Identity,
        connection_id: ConnectionId,
    ) -> Option<ConnectionId> {
        self.connections.insert(identity, connection_id)
    }

    /// Live connection for `identity`, if any
    pub fn lookup(&self, identity: &Identity) -> Option<ConnectionId> {
        self.connections.get(identity).copied()
    }

    /// Remove the entry owned by `connection_id`
    ///
    /// Reverse scan over the registry. Returns the identity that went
    /// offline, or None when the connection holds no entry (never
    /// registered, or superseded by a newer connection).
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<Identity> {
        let identity = self
            .connections
            .iter()
            .find(|(_, id)| **id == connection_id)
            .map(|(identity, _)| identity.clone())?;
        self.connections.remove(&identity);
        Some(identity)
    }

    /// Identities currently online, sorted
    pub fn roster(&self) -> Vec<Identity> {
        let mut roster: Vec<Identity> = self.connections.keys().cloned().collect();
        roster.sort();
        roster
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PresenceRegistry::new();
        let conn = ConnectionId::new();

        assert!(registry.register(id("alice"), conn).is_none());
        assert_eq!(registry.lookup(&id("alice")), Some(conn));
        assert!(registry.lookup(&id("bob")).is_none());
    }

    #[test]
    fn test_second_register_overwrites() {
        let mut registry = PresenceRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.register(id("alice"), first);
        assert_eq!(registry.register(id("alice"), second), Some(first));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(&id("alice")), Some(second));
    }

    #[test]
    fn test_unregister_orphaned_connection_is_noop() {
        let mut registry = PresenceRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();
        registry.register(id("alice"), first);
        registry.register(id("alice"), second);

        assert!(registry.unregister(first).is_none());
        assert_eq!(registry.lookup(&id("alice")), Some(second));

        assert_eq!(registry.unregister(second), Some(id("alice")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_roster_after_disconnect() {
        let mut registry = PresenceRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.register(id("a"), a);
        registry.register(id("b"), b);
        registry.unregister(a);

        assert_eq!(registry.roster(), vec![id("b")]);
    }
}
