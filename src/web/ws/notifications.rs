//! Article notification WebSocket handler.
//!
//! Every connected client is registered with the [`Broadcaster`] and receives
//! `NEW_ARTICLE` messages as articles are ingested. Clients never send
//! anything meaningful; incoming frames are only used to detect closure.
//!
//! [`Broadcaster`]: crate::notify::Broadcaster

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::web::handlers::AppState;

/// WebSocket notification handler.
///
/// GET /ws
pub async fn notifications_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection until either side closes it.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = format!("ws-{}", uuid::Uuid::new_v4());
    let mut events = state.broadcaster.add(client_id.clone()).await;

    tracing::info!(client_id = %client_id, "Notification client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("WebSocket closed by client: {}", client_id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Some(json) => {
                        if ws_sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    // Dropped by the broadcaster (queue overflow)
                    None => {
                        tracing::debug!("Notification queue closed: {}", client_id);
                        let _ = ws_sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    state.broadcaster.remove(&client_id).await;
    tracing::info!(client_id = %client_id, "Notification client disconnected");
}
