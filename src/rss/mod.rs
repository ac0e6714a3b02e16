//! Feed ingestion module for Newsdesk.
//!
//! This module fetches RSS/Atom feeds, imports OPML subscription lists and
//! turns feed entries into articles.

pub mod fetcher;
pub mod ingest;
pub mod opml;
pub mod types;
pub mod updater;

pub use fetcher::{parse_feed, validate_url, FeedFetcher};
pub use ingest::{placeholder_email, IngestService};
pub use self::opml::parse_opml;
pub use types::{FeedEntry, ImportFailure, ImportReport, OpmlSubscription, ParsedFeed};
pub use updater::{start_feed_poller, FeedPoller, PollSummary, DEFAULT_POLL_INTERVAL_SECS};
