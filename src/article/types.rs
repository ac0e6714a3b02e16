//! Article types for Newsdesk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of articles per listing page.
pub const PAGE_SIZE: usize = 9;

/// A stored article.
///
/// The JSON form uses camelCase field names and exposes the identity as
/// `_id`, which is also the offline cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article ID.
    #[serde(rename = "_id", alias = "id")]
    pub id: i64,
    pub title: String,
    /// HTML body.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Owning newsletter. `None` once the newsletter has been deleted.
    #[serde(default)]
    pub newsletter_id: Option<i64>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Visibility expiry; the poller unpublishes the article once it passes.
    #[serde(default)]
    pub publish_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    /// Source feed entry identifier.
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// New article for creation.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub newsletter_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub external_id: Option<String>,
    pub link: Option<String>,
}

impl NewArticle {
    /// Create a new article with a title and HTML body.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            thumbnail_url: None,
            newsletter_id: None,
            published_at: None,
            external_id: None,
            link: None,
        }
    }

    /// Set the owning newsletter.
    pub fn with_newsletter(mut self, newsletter_id: i64) -> Self {
        self.newsletter_id = Some(newsletter_id);
        self
    }

    /// Set the source feed entry identifier.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Set the original link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Set the source publish timestamp.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// One page of the article listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total_count: i64,
    pub has_more: bool,
}

/// Offset of the first article on a 1-based page. Pages below 1 are page 1.
pub fn page_offset(page: u32) -> usize {
    (page.max(1) as usize - 1) * PAGE_SIZE
}
