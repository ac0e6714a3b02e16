//! Real-time notification listener.
//!
//! Connects to the server's `/ws` endpoint and yields the articles carried by
//! `NEW_ARTICLE` messages.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::client::api::ArticleSource;
use crate::client::list::ArticleListController;
use crate::notify::ServerEvent;
use crate::{NewsdeskError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection settings for the notification socket.
#[derive(Debug, Clone)]
pub struct NotificationListener {
    ws_url: String,
}

/// A live notification connection.
pub struct NotificationStream {
    ws_stream: WsStream,
}

impl NotificationListener {
    /// Listener for an explicit WebSocket URL (e.g. `ws://host:8080/ws`).
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    /// Listener for the server at an HTTP base URL.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`.
    pub fn from_server_url(server_url: &str) -> Result<Self> {
        let mut url = url::Url::parse(server_url)
            .map_err(|e| NewsdeskError::Http(format!("invalid server URL: {}", e)))?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(NewsdeskError::Http(format!(
                    "unsupported server URL scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| NewsdeskError::Http("failed to derive WebSocket URL".to_string()))?;
        url.set_path("/ws");
        Ok(Self::new(url.to_string()))
    }

    /// WebSocket URL.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the notification socket.
    pub async fn connect(&self) -> Result<NotificationStream> {
        let (ws_stream, _response) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            NewsdeskError::Http(format!("failed to connect to {}: {}", self.ws_url, e))
        })?;

        info!("Connected to notification socket at {}", self.ws_url);
        Ok(NotificationStream { ws_stream })
    }
}

impl NotificationStream {
    /// Wait for the next announced article.
    ///
    /// Returns `Ok(None)` once the server closes the connection. Frames that
    /// are not a valid `NEW_ARTICLE` message are skipped.
    pub async fn next_article(&mut self) -> Result<Option<Article>> {
        while let Some(frame) = self.ws_stream.next().await {
            let frame = frame.map_err(|e| NewsdeskError::Http(format!("WebSocket error: {}", e)))?;
            match frame {
                Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => return Ok(Some(event.into_article())),
                    Err(e) => warn!("Ignoring unrecognized notification: {}", e),
                },
                Message::Ping(data) => {
                    let _ = self.ws_stream.send(Message::Pong(data)).await;
                }
                Message::Close(_) => {
                    debug!("Notification socket closed by server");
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Apply every announced article to `controller` until the connection
    /// closes. Returns the number of articles applied.
    pub async fn forward_to<S: ArticleSource>(
        &mut self,
        controller: &mut ArticleListController<S>,
    ) -> Result<usize> {
        let mut applied = 0;
        while let Some(article) = self.next_article().await? {
            controller.apply_notification(article).await;
            applied += 1;
        }
        Ok(applied)
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<()> {
        self.ws_stream
            .close(None)
            .await
            .map_err(|e| NewsdeskError::Http(format!("WebSocket close failed: {}", e)))
    }
}
