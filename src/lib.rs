//! Newsdesk - newsletter aggregator
//!
//! Ingests RSS/Atom feeds and OPML subscription lists into articles, serves
//! them over an HTTP API and pushes newly ingested articles to connected
//! WebSocket clients. The `client` module carries the reader-side toolkit.

pub mod article;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod newsletter;
pub mod notify;
pub mod rss;
pub mod web;

pub use article::{Article, ArticlePage, ArticleRepository, NewArticle, PAGE_SIZE};
pub use config::Config;
pub use db::Database;
pub use error::{NewsdeskError, Result};
pub use newsletter::{NewNewsletter, Newsletter, NewsletterRepository};
pub use notify::{Broadcaster, ServerEvent};
