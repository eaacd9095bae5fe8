//! WebSocket handler
//!
//! Upgrades connections, decodes inbound frames, and writes the outbound
//! queue back to the socket.

use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use hub_core::Message;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Header carrying the authenticated user id, set by the fronting proxy
pub const USER_ID_HEADER: &str = "x-user-id";

/// Query parameters accepted on upgrade
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    user_id: Option<String>,
}

/// How the read side of a connection ended
#[derive(Debug)]
enum ReadOutcome {
    Closed,
    Failed(String),
}

/// WebSocket upgrade handler
pub async fn socket_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    if !state.cors().is_origin_allowed(origin) {
        tracing::warn!(origin = ?origin, "Rejected upgrade from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
        .or(params.user_id)
        .unwrap_or_default();

    let limits = state.websocket();
    ws.max_message_size(limits.max_message_size)
        .write_buffer_size(limits.write_buffer_size)
        .on_upgrade(move |socket| handle_socket(state, socket, user_id))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, user_id: String) {
    let service = Arc::clone(state.service());

    // Create message channel for outgoing messages
    let (tx, mut rx) = mpsc::channel::<Message>(service.settings().outbound_buffer.max(1));
    let connection = service.connect(user_id, tx);
    let connection_id = connection.id().to_string();

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Spawn task to send queued messages to the WebSocket
    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(connection_id = %send_id, error = %e, "Failed to encode message");
                    continue;
                }
            };
            if ws_sink.send(WsMessage::Text(json)).await.is_err() {
                tracing::debug!(connection_id = %send_id, "Failed to send message to WebSocket");
                break;
            }
        }

        let _ = ws_sink.close().await;
    });

    // Spawn task to receive messages from the WebSocket
    let recv_service = Arc::clone(&service);
    let recv_connection = Arc::clone(&connection);
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = ws_stream.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => return ReadOutcome::Failed(e.to_string()),
            };

            // Any inbound frame counts as activity, even one that fails to decode
            recv_service.registry().touch(recv_connection.id());

            let decoded = match frame {
                WsMessage::Text(text) => Message::from_json(&text),
                WsMessage::Binary(bytes) => Message::from_slice(&bytes),
                WsMessage::Close(_) => return ReadOutcome::Closed,
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            };

            let message = match decoded {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %recv_connection.id(),
                        error = %e,
                        "Failed to decode message"
                    );
                    continue;
                }
            };

            if let Err(e) = recv_service.handle_message(&recv_connection, message).await {
                return ReadOutcome::Failed(e.to_string());
            }
        }
        ReadOutcome::Closed
    });

    // Wait for either side to finish, or for the service to stop
    tokio::select! {
        result = &mut recv_task => match result {
            Ok(ReadOutcome::Closed) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
            }
            Ok(ReadOutcome::Failed(reason)) => {
                tracing::warn!(connection_id = %connection_id, reason = %reason, "Connection ended abnormally");
            }
            Err(e) if e.is_panic() => {
                tracing::error!(connection_id = %connection_id, "Receive task panicked");
            }
            Err(_) => {}
        },
        result = &mut send_task => {
            if matches!(&result, Err(e) if e.is_panic()) {
                tracing::error!(connection_id = %connection_id, "Send task panicked");
            } else {
                tracing::debug!(connection_id = %connection_id, "Send task ended");
            }
        }
        () = service.scope().cancelled() => {
            tracing::debug!(connection_id = %connection_id, "Service stopping, closing connection");
        }
    }

    // Clean up
    recv_task.abort();
    service.disconnect(&connection).await;
    send_task.abort();
}
