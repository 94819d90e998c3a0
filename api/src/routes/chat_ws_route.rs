//! Live chat channel over WebSocket.
//!
//! One connection is bound to one user and serves any number of that
//! user's sessions: every inbound event names its `sessionId`. The read
//! loop persists each message and claims its session turn on receipt, so
//! within a session replies come strictly in arrival order; generation
//! itself runs in its own task, so a slow generation for one session
//! never blocks events for another.
//!
//! Inbound:  `{"type": "chat_message", "sessionId": 7, "content": "..."}`
//! Outbound: `{"type": "ai_response", "sessionId": 7, "message": {...}}`
//!           `{"type": "error", "sessionId": 7, "message": "..."}`

use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use forum_store::ChatMessage;

use crate::{core::app_state::AppState, middleware_layer::current_user::CurrentUser};

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundEvent {
    #[serde(rename_all = "camelCase")]
    ChatMessage { session_id: u64, content: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    AiResponse {
        session_id: u64,
        message: ChatMessage,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<u64>,
        message: String,
    },
}

pub async fn chat_ws(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user.0))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: u64) {
    let (mut sink, mut stream) = socket.split();

    // Single writer task; handlers push outbound events through the channel.
    let (tx, mut rx) = mpsc::channel::<OutboundEvent>(32);
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "failed to serialize outbound event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let msg = match frame {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "websocket read error; closing");
                break;
            }
        };

        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            // Ping/pong are handled by axum; binary frames are ignored.
            _ => continue,
        };

        let event: InboundEvent = match serde_json::from_str(text.as_str()) {
            Ok(e) => e,
            Err(e) => {
                let _ = tx
                    .send(OutboundEvent::Error {
                        session_id: None,
                        message: format!("malformed event: {e}"),
                    })
                    .await;
                continue;
            }
        };

        match event {
            InboundEvent::ChatMessage {
                session_id,
                content,
            } => {
                // The channel is bound to one user; reject foreign sessions.
                match state.store.get_session(session_id).await {
                    Some(s) if s.user_id == user_id => {}
                    _ => {
                        let _ = tx
                            .send(OutboundEvent::Error {
                                session_id: Some(session_id),
                                message: format!("chat session not found: {session_id}"),
                            })
                            .await;
                        continue;
                    }
                }

                // Persist and claim the session turn here, in arrival
                // order; only generation is deferred to a task.
                let pending = match state.orchestrator.accept_chat_message(session_id, &content).await
                {
                    Ok(p) => p,
                    Err(e) => {
                        let _ = tx
                            .send(OutboundEvent::Error {
                                session_id: Some(session_id),
                                message: e.to_string(),
                            })
                            .await;
                        continue;
                    }
                };

                let orch = state.orchestrator.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outbound = match orch.finish_chat_message(pending).await {
                        Ok(exchange) => OutboundEvent::AiResponse {
                            session_id,
                            message: exchange.reply,
                        },
                        Err(e) => {
                            warn!(session_id, error = %e, "websocket chat message failed");
                            OutboundEvent::Error {
                                session_id: Some(session_id),
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(outbound).await;
                });
            }
        }
    }

    drop(tx);
    let _ = writer.await;
}
