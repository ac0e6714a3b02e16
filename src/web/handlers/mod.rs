//! API handlers for the Newsdesk HTTP API.

pub mod article;
pub mod feed;
pub mod newsletter;

pub use article::*;
pub use feed::*;
pub use newsletter::*;

use std::sync::Arc;

use crate::db::Database;
use crate::notify::Broadcaster;
use crate::rss::IngestService;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Feed ingestion service.
    pub ingest: IngestService,
    /// WebSocket notification registry.
    pub broadcaster: Arc<Broadcaster>,
    /// Maximum OPML upload size in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The broadcaster is the one the ingestion service announces to.
    pub fn new(db: Database, ingest: IngestService, max_upload_bytes: usize) -> Self {
        let broadcaster = ingest.broadcaster().clone();
        Self {
            db,
            ingest,
            broadcaster,
            max_upload_bytes,
        }
    }
}
