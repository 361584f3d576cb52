//! WebSocket endpoint for realtime board subscriptions.
//!
//! One connection multiplexes any number of boards: the client sends
//! `{"type":"join","board_id":…}` / `{"type":"leave","board_id":…}` control
//! frames (both idempotent), and the server pushes committed change events
//! for every joined board as JSON text frames, in commit order per board.
//!
//! The connection's event queue is bounded; a client that stops reading
//! loses the newest events rather than stalling the publisher, and is
//! expected to re-sync via the board snapshot. There is no replay: a
//! subscriber that joins after a commit does not see it.

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use laneway_core::{defaults::WS_PING_INTERVAL_SECS, new_v7};
use laneway_engine::BoardRouter;

use crate::AppState;

/// Control frames a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Join { board_id: Uuid },
    Leave { board_id: Uuid },
}

/// `GET /api/v1/ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let connection_id = new_v7();
    let count = state.ws_connections.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        subsystem = "api",
        op = "ws_open",
        connection_id = %connection_id,
        active = count,
        "WebSocket connection opened"
    );

    let (mut sender, mut receiver) = socket.split();
    let (event_tx, mut event_rx) = BoardRouter::channel();
    let router = state.coordinator.router().clone();

    // Outbound: forward board events and keep the connection alive.
    let send_task = tokio::spawn(async move {
        let mut ping_interval =
            tokio::time::interval(Duration::from_secs(WS_PING_INTERVAL_SECS));
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    let Ok(json) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound: join/leave control frames until the client hangs up.
    let recv_router = router.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join { board_id }) => {
                        recv_router
                            .subscribe(board_id, connection_id, event_tx.clone())
                            .await;
                    }
                    Ok(ClientMessage::Leave { board_id }) => {
                        recv_router.unsubscribe(board_id, connection_id).await;
                    }
                    Err(error) => {
                        debug!(
                            subsystem = "api",
                            op = "ws_receive",
                            connection_id = %connection_id,
                            error = %error,
                            "Ignoring unparseable client frame"
                        );
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // Either direction ending means the connection is gone; drop every
    // subscription it held.
    router.disconnect(connection_id).await;
    let count = state.ws_connections.fetch_sub(1, Ordering::Relaxed) - 1;
    info!(
        subsystem = "api",
        op = "ws_close",
        connection_id = %connection_id,
        active = count,
        "WebSocket connection closed"
    );
}
