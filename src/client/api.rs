//! Article page sources.

use std::future::Future;
use std::time::Duration;

use crate::article::ArticlePage;
use crate::config::ClientConfig;
use crate::{NewsdeskError, Result};

/// Something that can serve pages of the article listing.
pub trait ArticleSource {
    /// Fetch the given 1-based page.
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<ArticlePage>> + Send;
}

/// Page source backed by the Newsdesk HTTP API.
#[derive(Clone)]
pub struct HttpArticleSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArticleSource {
    /// Create a source for the server at `base_url` (e.g. `http://host:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NewsdeskError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a source from the client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.server_url, Duration::from_secs(config.timeout_secs))
    }

    /// The server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ArticleSource for HttpArticleSource {
    async fn fetch_page(&self, page: u32) -> Result<ArticlePage> {
        let url = format!("{}/api/articles", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await
            .map_err(|e| NewsdeskError::Http(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(NewsdeskError::Http(format!(
                "GET {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .json::<ArticlePage>()
            .await
            .map_err(|e| NewsdeskError::Http(format!("invalid article page: {}", e)))
    }
}
