//! Board-scoped realtime fan-out.
//!
//! Connections register an outbound channel per subscribed board. Publishing
//! walks the board's subscribers only, so traffic on one board never wakes
//! connections watching another.
//!
//! Delivery is best-effort per subscriber: each connection has a bounded
//! queue, and a connection that falls behind loses the NEWEST events for
//! its boards (the send is simply dropped) rather than stalling the
//! publisher or other subscribers. Clients recover through the board
//! snapshot and activity feed, which are the durable truth.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use laneway_core::{defaults::CONNECTION_QUEUE_DEPTH, BoardEvent};

type SubscriberMap = HashMap<Uuid, HashMap<Uuid, mpsc::Sender<BoardEvent>>>;

/// Fan-out hub for committed change events. Cloning shares the hub.
#[derive(Clone, Default)]
pub struct BoardRouter {
    // board_id -> (connection_id -> sender)
    subscribers: Arc<RwLock<SubscriberMap>>,
}

impl BoardRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the outbound channel for one connection. The receiver side
    /// belongs to the connection's writer task.
    pub fn channel() -> (mpsc::Sender<BoardEvent>, mpsc::Receiver<BoardEvent>) {
        mpsc::channel(CONNECTION_QUEUE_DEPTH)
    }

    /// Subscribe a connection to a board's events.
    pub async fn subscribe(
        &self,
        board_id: Uuid,
        connection_id: Uuid,
        sender: mpsc::Sender<BoardEvent>,
    ) {
        let mut map = self.subscribers.write().await;
        map.entry(board_id).or_default().insert(connection_id, sender);
        debug!(
            subsystem = "router",
            op = "subscribe",
            board_id = %board_id,
            connection_id = %connection_id,
            "Subscribed connection to board"
        );
    }

    /// Unsubscribe a connection from one board.
    pub async fn unsubscribe(&self, board_id: Uuid, connection_id: Uuid) {
        let mut map = self.subscribers.write().await;
        if let Some(connections) = map.get_mut(&board_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                map.remove(&board_id);
            }
        }
    }

    /// Remove a connection from every board it watches.
    pub async fn disconnect(&self, connection_id: Uuid) {
        let mut map = self.subscribers.write().await;
        map.retain(|_, connections| {
            connections.remove(&connection_id);
            !connections.is_empty()
        });
        debug!(
            subsystem = "router",
            op = "disconnect",
            connection_id = %connection_id,
            "Removed connection from all boards"
        );
    }

    /// Deliver an event to every subscriber of its board. Connections whose
    /// queues are full miss this event; connections that hung up are pruned.
    pub async fn publish(&self, event: BoardEvent) {
        let mut closed: Vec<Uuid> = Vec::new();
        {
            let map = self.subscribers.read().await;
            let Some(connections) = map.get(&event.board_id) else {
                return;
            };
            for (connection_id, sender) in connections {
                match sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            subsystem = "router",
                            op = "publish",
                            board_id = %event.board_id,
                            connection_id = %connection_id,
                            seq = event.seq,
                            "Subscriber queue full; dropping event for this connection"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        closed.push(*connection_id);
                    }
                }
            }
        }
        for connection_id in closed {
            self.disconnect(connection_id).await;
        }
    }

    /// Number of connections currently watching a board.
    pub async fn subscriber_count(&self, board_id: Uuid) -> usize {
        self.subscribers
            .read()
            .await
            .get(&board_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }
}
