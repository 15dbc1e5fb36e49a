//! Channel membership
//!
//! Tracks which connections subscribed to which group rooms. Subscription
//! is explicit (`join_group`) and independent of persisted group
//! membership; no authorization happens here.

use std::collections::{HashMap, HashSet};

use crate::types::{ConnectionId, GroupId};

/// Room subscriptions, indexed both ways
#[derive(Debug, Default)]
pub struct ChannelMembership {
    /// GroupId -> subscribed connections
    rooms: HashMap<GroupId, HashSet<ConnectionId>>,
    /// ConnectionId -> joined rooms, for disconnect cleanup
    joined: HashMap<ConnectionId, HashSet<GroupId>>,
}

impl ChannelMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection. Returns false if it was already subscribed.
    pub fn join(&mut self, connection_id: ConnectionId, group_id: GroupId) -> bool {
        let added = self
            .rooms
            .entry(group_id.clone())
            .or_default()
            .insert(connection_id);
        self.joined.entry(connection_id).or_default().insert(group_id);
        added
    }

    /// Unsubscribe a connection. Returns false if it was not subscribed.
    pub fn leave(&mut self, connection_id: ConnectionId, group_id: &GroupId) -> bool {
        let removed = match self.rooms.get_mut(group_id) {
            Some(subscribers) => {
                let removed = subscribers.remove(&connection_id);
                if subscribers.is_empty() {
                    self.rooms.remove(group_id);
                }
                removed
            }
            None => false,
        };

        if let Some(groups) = self.joined.get_mut(&connection_id) {
            groups.remove(group_id);
            if groups.is_empty() {
                self.joined.remove(&connection_id);
            }
        }

        removed
    }

    /// Drop every subscription held by a connection, returning the rooms left
    pub fn leave_all(&mut self, connection_id: ConnectionId) -> Vec<GroupId> {
        let Some(groups) = self.joined.remove(&connection_id) else {
            return Vec::new();
        };

        for group_id in &groups {
            if let Some(subscribers) = self.rooms.get_mut(group_id) {
                subscribers.remove(&connection_id);
                if subscribers.is_empty() {
                    self.rooms.remove(group_id);
                }
            }
        }

        groups.into_iter().collect()
    }

    /// Connections currently subscribed to a room
    pub fn subscribers(&self, group_id: &GroupId) -> Vec<ConnectionId> {
        self.rooms
            .get(group_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, connection_id: ConnectionId, group_id: &GroupId) -> bool {
        self.rooms
            .get(group_id)
            .is_some_and(|s| s.contains(&connection_id))
    }

    /// Number of rooms with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_subscribers() {
        let mut membership = ChannelMembership::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let room = GroupId::new("g1");

        assert!(membership.join(a, room.clone()));
        assert!(!membership.join(a, room.clone()));
        membership.join(b, room.clone());

        let mut subs = membership.subscribers(&room);
        subs.sort_by_key(|c| c.0);
        let mut expected = vec![a, b];
        expected.sort_by_key(|c| c.0);
        assert_eq!(subs, expected);
    }

    #[test]
    fn test_leave_drops_empty_room() {
        let mut membership = ChannelMembership::new();
        let a = ConnectionId::new();
        let room = GroupId::new("g1");

        membership.join(a, room.clone());
        assert!(membership.leave(a, &room));
        assert!(!membership.leave(a, &room));
        assert!(membership.subscribers(&room).is_empty());
        assert_eq!(membership.room_count(), 0);
    }

    #[test]
    fn test_leave_all_on_disconnect() {
        let mut membership = ChannelMembership::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let g1 = GroupId::new("g1");
        let g2 = GroupId::new("g2");

        membership.join(a, g1.clone());
        membership.join(a, g2.clone());
        membership.join(b, g1.clone());

        let mut left = membership.leave_all(a);
        left.sort();
        assert_eq!(left, vec![g1.clone(), g2.clone()]);

        assert!(!membership.is_subscribed(a, &g1));
        assert!(membership.is_subscribed(b, &g1));
        assert_eq!(membership.room_count(), 1);
        assert!(membership.leave_all(a).is_empty());
    }
}
