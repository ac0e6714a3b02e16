//! Web API module for Newsdesk.
//!
//! This module provides the REST API for articles and newsletters and the
//! WebSocket endpoint that pushes newly ingested articles to clients.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
