//! The live session surface.
//!
//! Handshake order is fixed: verify the credential first, refuse and
//! close before any session state exists on failure. Only then is the
//! session registered and the queue wired up. Whatever way the
//! connection ends, cleanup runs unconditionally.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use hearth_auth::Identity;
use hearth_database::repos::{memberships, users};
use hearth_database::MessageBody;

use crate::broadcast::broadcast;
use crate::events::{ClientEvent, ServerEvent};
use crate::session::{OutboundQueue, SessionHandle, SessionId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WebSocketQuery>,
    State(state): State<AppState>,
) -> Result<Response, StatusCode> {
    let token = params.token.ok_or(StatusCode::UNAUTHORIZED)?;
    let identity = state.verifier().verify(&token).map_err(|err| {
        debug!(error = %err, "websocket credential refused");
        StatusCode::UNAUTHORIZED
    })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(socket: WebSocket, state: AppState, identity: Identity) {
    let (mut ws_sender, mut receiver) = socket.split();

    let session_id = SessionId::new();
    let queue = OutboundQueue::new(state.realtime().session_queue_capacity);
    let handle = SessionHandle {
        session_id,
        user_id: identity.user_id,
        queue: queue.clone(),
    };
    state.registry().register(handle.clone()).await;
    info!(session_id = %session_id, user_id = identity.user_id, "session connected");

    // Writer task: the single consumer of the outbound queue.
    let writer_queue = queue.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = writer_queue.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    error!(error = %err, "failed to serialize server event");
                    continue;
                }
            };
            if ws_sender.send(WsMessage::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    queue
        .push(ServerEvent::Hello {
            session_id: session_id.to_string(),
            user_id: identity.user_id,
        })
        .await;

    let idle_timeout = Duration::from_secs(state.realtime().idle_timeout_seconds);

    loop {
        let frame = match tokio::time::timeout(idle_timeout, receiver.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(_) => {
                info!(session_id = %session_id, "idle timeout, disconnecting session");
                break;
            }
        };

        match frame {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_client_event(event, &state, &handle).await,
                Err(err) => {
                    debug!(session_id = %session_id, error = %err, "unparseable client event");
                    handle
                        .queue
                        .push(ServerEvent::error("bad_event", "unrecognized event"))
                        .await;
                }
            },
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {} // ping/pong/binary handled by the transport
            Err(err) => {
                debug!(session_id = %session_id, error = %err, "websocket read error");
                break;
            }
        }
    }

    // Unconditional cleanup: rooms first, then the queue so the writer
    // task drains and exits.
    state.registry().remove_session(session_id).await;
    queue.close().await;
    let _ = writer.await;
    info!(session_id = %session_id, user_id = identity.user_id, "session disconnected");
}

async fn handle_client_event(event: ClientEvent, state: &AppState, handle: &SessionHandle) {
    match event {
        ClientEvent::Join { group_id } => {
            // Membership is re-checked against the directory on every
            // join, never cached from an earlier one.
            match memberships::is_member(state.pool(), group_id, handle.user_id).await {
                Ok(true) => {
                    state.registry().join(group_id, handle.session_id).await;
                    handle.queue.push(ServerEvent::Joined { group_id }).await;
                }
                Ok(false) => {
                    handle
                        .queue
                        .push(ServerEvent::error("membership_error", "not a member of this group"))
                        .await;
                }
                Err(err) => {
                    error!(error = %err, "membership lookup failed");
                    handle
                        .queue
                        .push(ServerEvent::error("internal_error", "failed to process event"))
                        .await;
                }
            }
        }
        ClientEvent::Leave { group_id } => {
            if state.registry().leave(group_id, handle.session_id).await {
                handle.queue.push(ServerEvent::Left { group_id }).await;
            } else {
                handle
                    .queue
                    .push(ServerEvent::error("membership_error", "not in this group"))
                    .await;
            }
        }
        ClientEvent::Send {
            group_id,
            content,
            attachment_ref,
        } => {
            let body = MessageBody {
                text: content,
                attachment_ref,
            };
            match crate::services::chat::send_message(
                state.pool(),
                group_id,
                handle.user_id,
                &body,
            )
            .await
            {
                Ok(message) => {
                    // The append is durable at this point; only now may
                    // anyone hear about the message.
                    let event = ServerEvent::from_message(&message);
                    broadcast(state.registry(), group_id, &event, Some(handle.session_id)).await;
                    dispatch_offline(state.clone(), message);
                }
                Err(crate::error::ServiceError::Validation(msg)) => {
                    handle
                        .queue
                        .push(ServerEvent::error("validation_error", msg))
                        .await;
                }
                Err(crate::error::ServiceError::Membership) => {
                    handle
                        .queue
                        .push(ServerEvent::error("membership_error", "not a member of this group"))
                        .await;
                }
                Err(err) => {
                    error!(error = %err, "message send failed");
                    handle
                        .queue
                        .push(ServerEvent::error("internal_error", "failed to process event"))
                        .await;
                }
            }
        }
        ClientEvent::Ping => {
            handle.queue.push(ServerEvent::Pong).await;
        }
    }
}

/// Hand the message to the dispatcher for every group member with no live
/// session. Runs detached so one slow push endpoint cannot stall the
/// sender's read loop.
fn dispatch_offline(state: AppState, message: hearth_database::Message) {
    tokio::spawn(async move {
        let members = match memberships::member_ids(state.pool(), message.group_id).await {
            Ok(members) => members,
            Err(err) => {
                warn!(error = %err, "member lookup for notification fan-out failed");
                return;
            }
        };

        let connected = state.registry().connected_user_ids().await;
        let recipients: Vec<i64> = members
            .into_iter()
            .filter(|id| *id != message.sender_id && !connected.contains(id))
            .collect();
        if recipients.is_empty() {
            return;
        }

        let sender_name = match users::find_by_id(state.pool(), message.sender_id).await {
            Ok(user) => user.name,
            Err(err) => {
                warn!(error = %err, "sender lookup failed, using placeholder name");
                "Someone".to_string()
            }
        };

        state
            .dispatcher()
            .dispatch_message(&message, &sender_name, &recipients)
            .await;
    });
}
