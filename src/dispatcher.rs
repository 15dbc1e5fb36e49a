//! Fan-out dispatcher
//!
//! Entry points for the HTTP layer. Every state change is persisted through
//! the store first; only then is a push handed to the relay actor. Pushes
//! are fire-and-forget: an offline target or a failed hydration never
//! turns a persisted write into an error, history fetches recover it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::delivery::{self, Transition};
use crate::error::{AppError, StoreError};
use crate::message::ServerMessage;
use crate::model::{Group, HydratedMessage, Message, MessageContent, MessageTarget, SenderProfile};
use crate::reaction::ReactionEdit;
use crate::server::ServerCommand;
use crate::store::Store;
use crate::types::{GroupId, Identity, MessageId};

/// Cloneable handle combining the store and the relay actor
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
    relay: mpsc::Sender<ServerCommand>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, relay: mpsc::Sender<ServerCommand>) -> Self {
        Self { store, relay }
    }

    /// Persist a direct message and push it to the recipient if online
    pub async fn send_direct(
        &self,
        sender: &Identity,
        recipient: &Identity,
        content: MessageContent,
    ) -> Result<Message, AppError> {
        let content = content.normalized();
        if content.is_empty() {
            return Err(AppError::EmptyMessage);
        }

        let message = Message::new(
            sender.clone(),
            MessageTarget::direct(recipient.clone()),
            content,
        );
        let message = self.store.create_message(message).await?;
        info!("Message {} sent from {} to {}", message.id, sender, recipient);

        if let Some(hydrated) = self.hydrate(&message).await {
            self.push(ServerCommand::PushToIdentity {
                identity: recipient.clone(),
                event: ServerMessage::NewMessage { message: hydrated },
            })
            .await;
        }

        Ok(message)
    }

    /// Persist a group message and push it to the room's subscribers
    ///
    /// The sender must be a persisted member of the group.
    pub async fn send_group(
        &self,
        sender: &Identity,
        group_id: &GroupId,
        content: MessageContent,
    ) -> Result<Message, AppError> {
        let content = content.normalized();
        if content.is_empty() {
            return Err(AppError::EmptyMessage);
        }

        self.member_group(sender, group_id).await?;

        let message = Message::new(
            sender.clone(),
            MessageTarget::group(group_id.clone()),
            content,
        );
        let message = self.store.create_message(message).await?;
        info!("Message {} sent from {} to group {}", message.id, sender, group_id);

        if let Some(hydrated) = self.hydrate(&message).await {
            self.push(ServerCommand::PushToRoom {
                group_id: group_id.clone(),
                event: ServerMessage::NewGroupMessage { message: hydrated },
            })
            .await;
        }

        Ok(message)
    }

    /// Set the caller's reaction on a message, replacing any earlier one
    pub async fn react(
        &self,
        message_id: MessageId,
        identity: &Identity,
        emoji: &str,
    ) -> Result<Message, AppError> {
        let edit = ReactionEdit::add(identity.clone(), emoji)?;
        let message = self
            .store
            .edit_reactions(message_id, &edit)
            .await
            .map_err(not_found(message_id))?;
        debug!("{} reacted to {}", identity, message_id);
        Ok(message)
    }

    /// Drop the caller's reaction on a message
    pub async fn remove_reaction(
        &self,
        message_id: MessageId,
        identity: &Identity,
    ) -> Result<Message, AppError> {
        let edit = ReactionEdit::remove(identity.clone());
        let message = self
            .store
            .edit_reactions(message_id, &edit)
            .await
            .map_err(not_found(message_id))?;
        debug!("{} cleared reaction on {}", identity, message_id);
        Ok(message)
    }

    /// Mark a direct message read and tell its sender
    ///
    /// Only the recipient may do this. Repeating it is a no-op.
    pub async fn mark_read(
        &self,
        message_id: MessageId,
        identity: &Identity,
    ) -> Result<Message, AppError> {
        let message = self.find_message(message_id).await?;
        delivery::authorize_read(&message, identity)?;

        let (message, outcome) = self
            .store
            .mark_read(message_id, Utc::now())
            .await
            .map_err(not_found(message_id))?;
        let Transition::Advanced(status) = outcome else {
            return Ok(message);
        };
        info!("Message {} read by {}", message_id, identity);

        self.push(ServerCommand::PushToIdentity {
            identity: message.sender_id.clone(),
            event: ServerMessage::MessageStatusUpdate { message_id, status },
        })
        .await;

        Ok(message)
    }

    /// Direct conversation between two identities, oldest first
    pub async fn direct_history(
        &self,
        me: &Identity,
        other: &Identity,
    ) -> Result<Vec<Message>, AppError> {
        Ok(self.store.conversation(me, other).await?)
    }

    /// Messages of a group the caller belongs to, oldest first
    pub async fn group_history(
        &self,
        me: &Identity,
        group_id: &GroupId,
    ) -> Result<Vec<Message>, AppError> {
        self.member_group(me, group_id).await?;
        Ok(self.store.group_messages(group_id).await?)
    }

    /// Identities with a live connection
    pub async fn online_users(&self) -> Result<Vec<Identity>, AppError> {
        let (reply, rx) = oneshot::channel();
        self.relay
            .send(ServerCommand::Roster { reply })
            .await
            .map_err(|_| AppError::RelayClosed)?;
        rx.await.map_err(|_| AppError::RelayClosed)
    }

    /// Tell room subscribers the group's details changed
    pub async fn group_updated(&self, group: Group) {
        self.push(ServerCommand::PushToRoom {
            group_id: group.id.clone(),
            event: ServerMessage::GroupUpdated { group },
        })
        .await;
    }

    /// Tell room subscribers the group is gone
    pub async fn group_deleted(&self, group_id: &GroupId) {
        self.push(ServerCommand::PushToRoom {
            group_id: group_id.clone(),
            event: ServerMessage::GroupDeleted {
                group_id: group_id.clone(),
            },
        })
        .await;
    }

    /// Tell room subscribers a member left
    pub async fn member_left(&self, group_id: &GroupId, identity: &Identity) {
        self.push(ServerCommand::PushToRoom {
            group_id: group_id.clone(),
            event: ServerMessage::MemberLeft {
                group_id: group_id.clone(),
                user_id: identity.clone(),
            },
        })
        .await;
    }

    /// Helper: Load a message or fail with not-found
    async fn find_message(&self, message_id: MessageId) -> Result<Message, AppError> {
        self.store
            .find_message(message_id)
            .await?
            .ok_or(AppError::MessageNotFound(message_id))
    }

    /// Helper: Load a group and check the caller is a member
    async fn member_group(&self, identity: &Identity, group_id: &GroupId) -> Result<Group, AppError> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(group_id.clone()))?;

        if !group.is_member(identity) {
            return Err(AppError::NotGroupMember(group_id.clone()));
        }
        Ok(group)
    }

    /// Helper: Attach the sender profile; None skips the push
    async fn hydrate(&self, message: &Message) -> Option<HydratedMessage> {
        match self.store.find_profile(&message.sender_id).await {
            Ok(Some(profile)) => Some(HydratedMessage {
                message: message.clone(),
                sender: SenderProfile::from(profile),
            }),
            Ok(None) => {
                warn!(
                    "No profile for {}, push of {} skipped",
                    message.sender_id, message.id
                );
                None
            }
            Err(e) => {
                warn!("Hydration of {} failed, push skipped: {}", message.id, e);
                None
            }
        }
    }

    /// Helper: Hand a push to the relay; a closed relay drops it
    async fn push(&self, cmd: ServerCommand) {
        if self.relay.send(cmd).await.is_err() {
            warn!("Relay closed, push dropped");
        }
    }
}

/// Map a store failure on `message_id`, a vanished record being not-found
fn not_found(message_id: MessageId) -> impl FnOnce(StoreError) -> AppError {
    move |e| match e {
        StoreError::Missing => AppError::MessageNotFound(message_id),
        other => AppError::Store(other),
    }
}
