//! Persisted-store collaborator
//!
//! `Store` is the narrow contract the relay consumes for messages, groups
//! and profiles. `MemoryStore` is a process-local implementation used by
//! the binary and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::delivery::{apply_read, Transition};
use crate::error::StoreError;
use crate::model::{Group, Message, UserProfile};
use crate::reaction::ReactionEdit;
use crate::types::{GroupId, Identity, MessageId};

/// Persisted entity access
///
/// Each call is atomic per record; nothing spans calls. Updates touch only
/// their own fields of the current stored record, so concurrent edits to
/// different fields of one message never undo each other.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new message
    async fn create_message(&self, message: Message) -> Result<Message, StoreError>;

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Apply a reaction edit, returning the updated message.
    /// `StoreError::Missing` if it is gone.
    async fn edit_reactions(
        &self,
        id: MessageId,
        edit: &ReactionEdit,
    ) -> Result<Message, StoreError>;

    /// Move a message to `read`, returning it with the outcome.
    /// `StoreError::Missing` if it is gone.
    async fn mark_read(
        &self,
        id: MessageId,
        seen_at: DateTime<Utc>,
    ) -> Result<(Message, Transition), StoreError>;

    /// Direct messages between two identities, oldest first
    async fn conversation(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Vec<Message>, StoreError>;

    /// Messages posted to a group, oldest first
    async fn group_messages(&self, group_id: &GroupId) -> Result<Vec<Message>, StoreError>;

    async fn find_group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError>;

    async fn find_profile(&self, identity: &Identity) -> Result<Option<UserProfile>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order doubles as creation order
    messages: Vec<Message>,
    groups: HashMap<GroupId, Group>,
    profiles: HashMap<Identity, UserProfile>,
}

impl MemoryState {
    fn message_mut(&mut self, id: MessageId) -> Result<&mut Message, StoreError> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::Missing)
    }
}

/// In-memory `Store`
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group record
    pub async fn put_group(&self, group: Group) {
        self.state.write().await.groups.insert(group.id.clone(), group);
    }

    /// Insert or replace a profile record
    pub async fn put_profile(&self, profile: UserProfile) {
        self.state
            .write()
            .await
            .profiles
            .insert(profile.identity.clone(), profile);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_message(&self, message: Message) -> Result<Message, StoreError> {
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let state = self.state.read().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn edit_reactions(
        &self,
        id: MessageId,
        edit: &ReactionEdit,
    ) -> Result<Message, StoreError> {
        let mut state = self.state.write().await;
        let stored = state.message_mut(id)?;
        edit.apply(&mut stored.reactions);
        Ok(stored.clone())
    }

    async fn mark_read(
        &self,
        id: MessageId,
        seen_at: DateTime<Utc>,
    ) -> Result<(Message, Transition), StoreError> {
        let mut state = self.state.write().await;
        let stored = state.message_mut(id)?;
        let outcome = apply_read(stored, seen_at);
        Ok((stored.clone(), outcome))
    }

    async fn conversation(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect())
    }

    async fn group_messages(&self, group_id: &GroupId) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.group_id() == Some(group_id))
            .cloned()
            .collect())
    }

    async fn find_group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self.state.read().await.groups.get(group_id).cloned())
    }

    async fn find_profile(&self, identity: &Identity) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.state.read().await.profiles.get(identity).cloned())
    }
}
