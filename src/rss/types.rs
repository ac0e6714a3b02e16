//! Feed types for Newsdesk.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::article::NewArticle;
use crate::newsletter::Newsletter;

/// A fetched and parsed RSS/Atom document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Feed title, if the document declares one.
    pub title: Option<String>,
    /// Site URL (the website the feed belongs to).
    pub site_url: Option<String>,
    /// Entries in document order.
    pub entries: Vec<FeedEntry>,
}

/// A single feed entry.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// RSS guid or Atom id.
    pub external_id: String,
    /// Entry title. Entries without one are not ingested.
    pub title: Option<String>,
    /// HTML body (content, else summary).
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Map the entry to a new article owned by `newsletter_id`.
    ///
    /// Returns `None` for entries missing a non-blank title.
    pub fn to_new_article(&self, newsletter_id: i64) -> Option<NewArticle> {
        let title = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

        let mut article = NewArticle::new(title, self.content.clone())
            .with_newsletter(newsletter_id)
            .with_external_id(self.external_id.clone());
        if let Some(ref url) = self.thumbnail_url {
            article = article.with_thumbnail_url(url.clone());
        }
        if let Some(ref link) = self.link {
            article = article.with_link(link.clone());
        }
        if let Some(published_at) = self.published_at {
            article = article.with_published_at(published_at);
        }
        Some(article)
    }
}

/// A subscription listed in an OPML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpmlSubscription {
    pub name: String,
    pub rss_url: String,
}

/// A subscription that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub name: String,
    pub url: String,
    pub error: String,
}

/// Outcome of an OPML import.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Newsletters created or updated, in document order.
    pub imported: Vec<Newsletter>,
    /// Articles created across all imported newsletters.
    pub articles_created: usize,
    /// Subscriptions whose feed could not be fetched or parsed.
    pub failures: Vec<ImportFailure>,
}
