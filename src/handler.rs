//! WebSocket connection handler
//!
//! Handles individual connections: WebSocket handshake, identity
//! extraction, frame parsing, and bidirectional communication with the
//! RelayServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::signaling::TypingSignal;
use crate::types::{ConnectionId, Identity};

/// Handshake query parameter carrying the identity
const IDENTITY_PARAM: &str = "userId";

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, reads the identity from the request
/// query, and runs the read/write tasks until either side closes.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    connection_buffer: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake, capturing the identity on the way
    let mut identity: Option<Identity> = None;
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        identity = req.uri().query().and_then(identity_from_query);
        Ok(resp)
    };
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, callback).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = ConnectionId::new();
    match &identity {
        Some(identity) => info!(
            "Connection {} from {} as {}",
            connection_id, peer_addr, identity
        ),
        None => info!(
            "Connection {} from {} without identity",
            connection_id, peer_addr
        ),
    }

    // Create channel for relay -> client events
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(connection_buffer);

    // Send connection success message before any relay traffic
    let connected_msg = ServerMessage::Connected {
        connection_id,
        user_id: identity.clone(),
    };
    let json = serde_json::to_string(&connected_msg)?;
    ws_sender.send(Message::Text(json.into())).await?;

    // Register with RelayServer
    if cmd_tx
        .send(ServerCommand::Connect {
            connection_id,
            identity,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register connection {} - relay closed", connection_id);
        return Err(AppError::RelayClosed);
    }

    // Clone cmd_tx for read task
    let cmd_tx_read = cmd_tx.clone();

    // Spawn read task (WebSocket -> ServerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        let cmd = client_message_to_command(connection_id, client_msg);
                        if cmd_tx_read.send(cmd).await.is_err() {
                            debug!("Relay closed, ending read task for {}", connection_id);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Invalid frame from {}: {}", connection_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", connection_id);
                    break;
                }
                Ok(_) => {
                    // Binary, ping/pong - pongs are handled by tungstenite
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", connection_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", connection_id);
    });

    // Spawn write task (ServerMessage -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", connection_id);

        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", connection_id);
        }
        _ = write_task => {
            debug!("Write task completed for {}", connection_id);
        }
    }

    let _ = cmd_tx
        .send(ServerCommand::Disconnect { connection_id })
        .await;

    info!("Connection {} closed", connection_id);

    Ok(())
}

/// Extract a valid identity from a raw query string
///
/// The query is form-urlencoded; blank or padded values are ignored.
fn identity_from_query(query: &str) -> Option<Identity> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == IDENTITY_PARAM)
        .and_then(|(_, value)| Identity::parse(&value).ok())
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(connection_id: ConnectionId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::Typing { to_user_id } => ServerCommand::DirectTyping {
            connection_id,
            to: to_user_id,
            signal: TypingSignal::Started,
        },
        ClientMessage::StopTyping { to_user_id } => ServerCommand::DirectTyping {
            connection_id,
            to: to_user_id,
            signal: TypingSignal::Stopped,
        },
        ClientMessage::GroupTyping { group_id } => ServerCommand::GroupTyping {
            connection_id,
            group_id,
            signal: TypingSignal::Started,
        },
        ClientMessage::GroupStopTyping { group_id } => ServerCommand::GroupTyping {
            connection_id,
            group_id,
            signal: TypingSignal::Stopped,
        },
        ClientMessage::JoinGroup { group_id } => ServerCommand::JoinGroup {
            connection_id,
            group_id,
        },
        ClientMessage::LeaveGroup { group_id } => ServerCommand::LeaveGroup {
            connection_id,
            group_id,
        },
        ClientMessage::MessageDelivered { message_id }
        | ClientMessage::GroupMessageDelivered { message_id, .. } => ServerCommand::Delivered {
            connection_id,
            message_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupId, MessageId};

    #[test]
    fn test_identity_from_query() {
        assert_eq!(
            identity_from_query("foo=1&userId=alice"),
            Some(Identity::parse("alice").unwrap())
        );
        assert!(identity_from_query("userId=").is_none());
        assert!(identity_from_query("user=alice").is_none());
        assert!(identity_from_query("").is_none());
    }

    #[test]
    fn test_identity_from_query_decoded() {
        assert_eq!(
            identity_from_query("userId=jane%40mail.com"),
            Some(Identity::parse("jane@mail.com").unwrap())
        );
        assert_eq!(
            identity_from_query("userId=ann+lee&x=1"),
            Some(Identity::parse("ann lee").unwrap())
        );
        assert!(identity_from_query("userId=%20bob").is_none());
    }

    #[test]
    fn test_stop_typing_maps_to_stopped_signal() {
        let connection_id = ConnectionId::new();
        let cmd = client_message_to_command(
            connection_id,
            ClientMessage::StopTyping {
                to_user_id: Identity::parse("bob").unwrap(),
            },
        );
        assert!(matches!(
            cmd,
            ServerCommand::DirectTyping {
                signal: TypingSignal::Stopped,
                ..
            }
        ));
    }

    #[test]
    fn test_group_delivered_maps_to_notice() {
        let message_id = MessageId::new();
        let cmd = client_message_to_command(
            ConnectionId::new(),
            ClientMessage::GroupMessageDelivered {
                message_id,
                group_id: GroupId::new("g1"),
            },
        );
        match cmd {
            ServerCommand::Delivered { message_id: got, .. } => assert_eq!(got, message_id),
            other => panic!("Wrong command: {:?}", other),
        }
    }
}
