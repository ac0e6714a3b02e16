//! Newsletter types for Newsdesk.

use serde::{Deserialize, Serialize};

/// A registered newsletter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    /// Newsletter ID.
    #[serde(rename = "_id", alias = "id")]
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact email (unique).
    pub email: String,
    /// RSS/Atom feed URL.
    #[serde(default)]
    pub rss_url: Option<String>,
    /// Whether the newsletter is polled.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Newsletter {
    /// The feed URL, if the newsletter has a non-blank one.
    pub fn feed_url(&self) -> Option<&str> {
        self.rss_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// New newsletter for creation.
#[derive(Debug, Clone)]
pub struct NewNewsletter {
    pub name: String,
    pub email: String,
    pub rss_url: Option<String>,
    pub active: bool,
}

impl NewNewsletter {
    /// Create a new active newsletter without a feed.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            rss_url: None,
            active: true,
        }
    }

    /// Set the feed URL.
    pub fn with_rss_url(mut self, rss_url: impl Into<String>) -> Self {
        self.rss_url = Some(rss_url.into());
        self
    }

    /// Create the newsletter in the inactive state.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
