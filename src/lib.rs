//! Real-time Chat Relay Library
//!
//! The synchronization layer of a chat service: tracks which identities
//! are online, routes persisted messages to live connections or group room
//! subscribers, advances message read state, keeps one reaction per user
//! per message, and relays typing signals.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RelayServer` is the single owner of presence and room subscriptions
//! - Each WebSocket has a `handler` task feeding commands to the relay
//! - `Dispatcher` is the API for the HTTP layer: it writes through a `Store`
//!   first and only then asks the relay to push
//!
//! Presence and rooms are process-local. Running more than one relay
//! process needs an external shared registry.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{handle_connection, Dispatcher, MemoryStore, RelayServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(RelayServer::new(cmd_rx).run());
//!     let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), cmd_tx.clone());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, cmd_tx.clone(), 32));
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod membership;
pub mod message;
pub mod model;
pub mod presence;
pub mod reaction;
pub mod server;
pub mod signaling;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::RelayConfig;
pub use connection::Connection;
pub use delivery::{MessageStatus, Transition};
pub use dispatcher::Dispatcher;
pub use error::{AppError, SendError, StoreError};
pub use handler::handle_connection;
pub use membership::ChannelMembership;
pub use message::{ClientMessage, ServerMessage};
pub use model::{Group, HydratedMessage, Message, MessageContent, MessageTarget, Reaction, UserProfile};
pub use presence::PresenceRegistry;
pub use reaction::ReactionEdit;
pub use server::{RelayServer, ServerCommand};
pub use store::{MemoryStore, Store};
pub use types::{ConnectionId, GroupId, Identity, MessageId};
