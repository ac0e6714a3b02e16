//! Newsletter module for Newsdesk.
//!
//! A newsletter is a registered source of articles, optionally backed by an
//! RSS/Atom feed that the ingestion service polls.

mod repository;
mod types;

pub use repository::NewsletterRepository;
pub use types::{NewNewsletter, Newsletter};
