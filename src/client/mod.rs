//! Client toolkit for Newsdesk.
//!
//! The pieces a reader application needs: a page source for the HTTP API,
//! an offline article cache, the list controller that merges both with
//! pushed notifications, and the WebSocket notification listener.

pub mod api;
pub mod cache;
pub mod list;
pub mod listener;

pub use api::{ArticleSource, HttpArticleSource};
pub use cache::{OfflineArticleCache, CACHE_SCHEMA_VERSION};
pub use list::ArticleListController;
pub use listener::{NotificationListener, NotificationStream};
