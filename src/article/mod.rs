//! Article module for Newsdesk.
//!
//! Articles are created by feed ingestion (or manually), then published,
//! scheduled and archived through the HTTP API. They are never hard-deleted.

mod repository;
mod types;

pub use repository::ArticleRepository;
pub use types::{page_offset, Article, ArticlePage, NewArticle, PAGE_SIZE};
