//! Notification module for Newsdesk.
//!
//! Fans `NEW_ARTICLE` events out to every connected real-time client.

mod broadcaster;
mod messages;

pub use broadcaster::{Broadcaster, DEFAULT_CLIENT_BUFFER};
pub use messages::{ArticleEnvelope, ServerEvent};
