//! Connection registry and fan-out for real-time events.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::messages::ServerEvent;

/// Default queue depth per client.
pub const DEFAULT_CLIENT_BUFFER: usize = 64;

/// A registered client.
struct ClientConnection {
    sender: mpsc::Sender<String>,
    connected_at: chrono::DateTime<chrono::Utc>,
}

/// Registry of connected real-time clients.
///
/// Shared behind an `Arc`. `add` and `remove` take the write lock; `broadcast`
/// iterates under the read lock and only performs non-blocking sends, so a
/// client that stops draining its queue never delays the others. Clients
/// whose queue is full or closed are removed after the iteration.
///
/// Delivery is at-most-once and there is no backlog: a client registered
/// after an event never sees it.
pub struct Broadcaster {
    connections: RwLock<HashMap<String, ClientConnection>>,
    client_buffer: usize,
}

impl Broadcaster {
    /// Create an empty registry with the default queue depth.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_CLIENT_BUFFER)
    }

    /// Create an empty registry with a specific queue depth per client.
    pub fn with_buffer(client_buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            client_buffer: client_buffer.max(1),
        }
    }

    /// Register a client.
    ///
    /// Returns the receiving half of its queue. Registering an ID twice
    /// replaces the earlier connection.
    pub async fn add(&self, client_id: impl Into<String>) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.client_buffer);
        let client_id = client_id.into();
        debug!("Registering notification client {}", client_id);
        self.connections.write().await.insert(
            client_id,
            ClientConnection {
                sender: tx,
                connected_at: chrono::Utc::now(),
            },
        );
        rx
    }

    /// Remove a client. Unknown IDs are ignored.
    pub async fn remove(&self, client_id: &str) -> bool {
        let removed = self.connections.write().await.remove(client_id).is_some();
        if removed {
            debug!("Removed notification client {}", client_id);
        }
        removed
    }

    /// Send an event to every connected client.
    ///
    /// Returns the number of clients the event was queued for.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize event: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dropped = Vec::new();
        {
            let connections = self.connections.read().await;
            for (client_id, conn) in connections.iter() {
                match conn.sender.try_send(payload.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            "Notification client {} is not keeping up (connected since {}), dropping",
                            client_id, conn.connected_at
                        );
                        dropped.push(client_id.clone());
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dropped.push(client_id.clone());
                    }
                }
            }
        }

        if !dropped.is_empty() {
            let mut connections = self.connections.write().await;
            for client_id in &dropped {
                connections.remove(client_id);
            }
        }

        delivered
    }

    /// Return the current number of connected clients.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Check whether a client is registered.
    pub async fn is_connected(&self, client_id: &str) -> bool {
        self.connections.read().await.contains_key(client_id)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
