//! Real-time event types pushed to connected clients.

use serde::{Deserialize, Serialize};

use crate::article::Article;

/// Wrapper around the article payload of a `NEW_ARTICLE` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEnvelope {
    pub data: Article,
}

/// Events sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// A new article was created by ingestion.
    NewArticle { article: ArticleEnvelope },
}

impl ServerEvent {
    /// Build a `NEW_ARTICLE` event.
    pub fn new_article(article: Article) -> Self {
        ServerEvent::NewArticle {
            article: ArticleEnvelope { data: article },
        }
    }

    /// The article carried by the event.
    pub fn article(&self) -> &Article {
        match self {
            ServerEvent::NewArticle { article } => &article.data,
        }
    }

    /// Consume the event and return its article.
    pub fn into_article(self) -> Article {
        match self {
            ServerEvent::NewArticle { article } => article.data,
        }
    }
}
