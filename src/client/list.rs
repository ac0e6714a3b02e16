//! Article list controller.
//!
//! Merges server pages, cached articles and pushed notifications into one
//! list keyed by article ID and exposes the slice the reader should see.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::article::{Article, PAGE_SIZE};
use crate::client::api::{ArticleSource, HttpArticleSource};
use crate::client::cache::OfflineArticleCache;
use crate::config::ClientConfig;
use crate::Result;

/// Client-side article list state.
pub struct ArticleListController<S> {
    source: S,
    cache: OfflineArticleCache,
    articles: BTreeMap<i64, Article>,
    /// Last page fetched successfully; `None` until the first success.
    loaded_page: Option<u32>,
    server_has_more: bool,
}

impl<S: ArticleSource> ArticleListController<S> {
    /// Create a controller showing page 1 with nothing loaded.
    pub fn new(source: S, cache: OfflineArticleCache) -> Self {
        Self {
            source,
            cache,
            articles: BTreeMap::new(),
            loaded_page: None,
            server_has_more: false,
        }
    }

    /// Seed the list from the offline cache.
    ///
    /// Returns the number of cached articles; a cache failure yields 0.
    pub async fn load_cached(&mut self) -> usize {
        match self.cache.get_all().await {
            Ok(cached) => {
                let count = cached.len();
                self.merge(cached);
                debug!("Loaded {} cached article(s)", count);
                count
            }
            Err(e) => {
                warn!("Failed to read offline cache: {}", e);
                0
            }
        }
    }

    /// Fetch page `page` from the server and merge it.
    ///
    /// The fetched articles are also written to the offline cache. A cache
    /// failure is logged and does not fail the load.
    pub async fn load_page(&mut self, page: u32) -> Result<usize> {
        let page = page.max(1);
        let fetched = self.source.fetch_page(page).await?;

        if let Err(e) = self.cache.put(&fetched.articles).await {
            warn!("Failed to cache page {}: {}", page, e);
        }

        let count = fetched.articles.len();
        self.merge(fetched.articles);
        self.loaded_page = Some(page);
        self.server_has_more = fetched.has_more;
        Ok(count)
    }

    /// Fetch the page after the last one loaded, or page 1 if none was.
    pub async fn load_more(&mut self) -> Result<usize> {
        let next = self.loaded_page.map_or(1, |page| page + 1);
        self.load_page(next).await
    }

    /// Merge a pushed article and cache it.
    pub async fn apply_notification(&mut self, article: Article) {
        if let Err(e) = self.cache.put(std::slice::from_ref(&article)).await {
            warn!("Failed to cache notified article {}: {}", article.id, e);
        }
        self.merge([article]);
    }

    /// The articles to display: newest first, `page * 9` at most.
    pub fn visible(&self) -> Vec<&Article> {
        self.articles
            .values()
            .rev()
            .take(self.visible_limit())
            .collect()
    }

    /// Whether a "load more" action would reveal anything.
    pub fn can_load_more(&self) -> bool {
        self.server_has_more || self.articles.len() > self.visible_limit()
    }

    /// Current page number (1 before any page was loaded).
    pub fn page(&self) -> u32 {
        self.loaded_page.unwrap_or(1)
    }

    /// Number of distinct articles known to the controller.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether no article is known yet.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    fn visible_limit(&self) -> usize {
        self.page() as usize * PAGE_SIZE
    }

    fn merge(&mut self, articles: impl IntoIterator<Item = Article>) {
        for article in articles {
            self.articles.insert(article.id, article);
        }
    }
}

impl ArticleListController<HttpArticleSource> {
    /// Build a controller for the configured server, with the offline cache
    /// opened (or created) at `cache_path`.
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let source = HttpArticleSource::from_config(config)?;
        let cache = OfflineArticleCache::open(&config.cache_path).await?;
        Ok(Self::new(source, cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticlePage;
    use crate::NewsdeskError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn article(id: i64) -> Article {
        Article {
            id,
            title: format!("Article {}", id),
            content: String::new(),
            thumbnail_url: None,
            newsletter_id: None,
            published: false,
            published_at: None,
            publish_until: None,
            archived: false,
            external_id: None,
            link: None,
        }
    }

    /// Serves ids `total..=1` in pages of nine, like the server does.
    struct FakeSource {
        total: i64,
        calls: Arc<AtomicUsize>,
    }

    impl ArticleSource for FakeSource {
        async fn fetch_page(&self, page: u32) -> Result<ArticlePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let offset = (page as i64 - 1) * PAGE_SIZE as i64;
            let articles: Vec<Article> = (1..=self.total)
                .rev()
                .skip(offset as usize)
                .take(PAGE_SIZE)
                .map(article)
                .collect();
            let has_more = offset + (articles.len() as i64) < self.total;
            Ok(ArticlePage {
                articles,
                total_count: self.total,
                has_more,
            })
        }
    }

    struct OfflineSource;

    impl ArticleSource for OfflineSource {
        async fn fetch_page(&self, _page: u32) -> Result<ArticlePage> {
            Err(NewsdeskError::Http("connection refused".into()))
        }
    }

    /// Fails its first `failures` calls, then serves one page of three.
    struct FlakySource {
        failures: usize,
        requested: Arc<std::sync::Mutex<Vec<u32>>>,
    }

    impl ArticleSource for FlakySource {
        async fn fetch_page(&self, page: u32) -> Result<ArticlePage> {
            let calls = {
                let mut requested = self.requested.lock().unwrap();
                requested.push(page);
                requested.len()
            };
            if calls <= self.failures {
                return Err(NewsdeskError::Http("connection refused".into()));
            }
            Ok(ArticlePage {
                articles: vec![article(3), article(2), article(1)],
                total_count: 3,
                has_more: false,
            })
        }
    }

    fn ids(controller: &ArticleListController<impl ArticleSource>) -> Vec<i64> {
        controller.visible().iter().map(|a| a.id).collect()
    }

    async fn controller(total: i64) -> ArticleListController<FakeSource> {
        let cache = OfflineArticleCache::open_in_memory().await.unwrap();
        let source = FakeSource {
            total,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        ArticleListController::new(source, cache)
    }

    #[tokio::test]
    async fn test_load_pages() {
        let mut list = controller(20).await;

        assert_eq!(list.load_page(1).await.unwrap(), 9);
        assert_eq!(ids(&list), (12..=20).rev().collect::<Vec<_>>());
        assert!(list.can_load_more());

        assert_eq!(list.load_more().await.unwrap(), 9);
        assert_eq!(list.page(), 2);
        assert_eq!(list.visible().len(), 18);
        assert!(list.can_load_more());

        assert_eq!(list.load_more().await.unwrap(), 2);
        assert_eq!(ids(&list), (1..=20).rev().collect::<Vec<_>>());
        assert!(!list.can_load_more());
    }

    #[tokio::test]
    async fn test_pages_are_cached() {
        let mut list = controller(5).await;
        list.load_page(1).await.unwrap();

        let mut cached = list.cache.get_all().await.unwrap();
        cached.sort_by_key(|a| a.id);
        assert_eq!(cached.len(), 5);
        assert_eq!(cached[0].id, 1);
    }

    #[tokio::test]
    async fn test_notification_is_shown_first_and_cached() {
        let mut list = controller(9).await;
        list.load_page(1).await.unwrap();
        assert!(!list.can_load_more());

        list.apply_notification(article(10)).await;

        assert_eq!(list.visible()[0].id, 10);
        assert_eq!(list.visible().len(), 9);
        // The tenth article is beyond the first page
        assert!(list.can_load_more());
        assert!(list.cache.get_all().await.unwrap().iter().any(|a| a.id == 10));
    }

    #[tokio::test]
    async fn test_notification_replaces_same_id() {
        let mut list = controller(3).await;
        list.load_page(1).await.unwrap();

        let mut updated = article(3);
        updated.title = "Updated".to_string();
        list.apply_notification(updated).await;

        assert_eq!(list.len(), 3);
        assert_eq!(list.visible()[0].title, "Updated");
    }

    #[tokio::test]
    async fn test_offline_start_uses_cache() {
        let cache = OfflineArticleCache::open_in_memory().await.unwrap();
        cache.put(&[article(1), article(2)]).await.unwrap();

        let mut list = ArticleListController::new(OfflineSource, cache);
        assert!(list.is_empty());
        assert_eq!(list.load_cached().await, 2);
        assert_eq!(ids(&list), vec![2, 1]);

        assert!(list.load_page(1).await.is_err());
        assert_eq!(ids(&list), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_load_more_after_failed_first_page() {
        let cache = OfflineArticleCache::open_in_memory().await.unwrap();
        let requested = Arc::new(std::sync::Mutex::new(Vec::new()));
        let source = FlakySource {
            failures: 1,
            requested: requested.clone(),
        };
        let mut list = ArticleListController::new(source, cache);

        assert!(list.load_page(1).await.is_err());
        assert_eq!(list.page(), 1);

        assert_eq!(list.load_more().await.unwrap(), 3);
        assert_eq!(*requested.lock().unwrap(), vec![1, 1]);
        assert_eq!(list.page(), 1);
        assert_eq!(ids(&list), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_page() {
        let cache = OfflineArticleCache::open_in_memory().await.unwrap();
        let mut offline = ArticleListController::new(OfflineSource, cache);
        assert!(offline.load_more().await.is_err());
        assert!(offline.load_more().await.is_err());
        assert_eq!(offline.page(), 1);
    }

    #[tokio::test]
    async fn test_from_config_opens_cache_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            server_url: "http://127.0.0.1:1".to_string(),
            cache_path: dir
                .path()
                .join("cache/articles.db")
                .to_string_lossy()
                .into_owned(),
            timeout_secs: 2,
        };

        {
            let mut list = ArticleListController::from_config(&config).await.unwrap();
            assert_eq!(list.load_cached().await, 0);
            list.apply_notification(article(5)).await;
        }
        assert!(dir.path().join("cache/articles.db").exists());

        let mut reopened = ArticleListController::from_config(&config).await.unwrap();
        assert_eq!(reopened.load_cached().await, 1);
        assert!(reopened.load_more().await.is_err());
        assert_eq!(ids(&reopened), vec![5]);
    }

    #[tokio::test]
    async fn test_cached_and_fetched_merge_by_id() {
        let cache = OfflineArticleCache::open_in_memory().await.unwrap();
        cache.put(&[article(2), article(30)]).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource {
            total: 3,
            calls: calls.clone(),
        };
        let mut list = ArticleListController::new(source, cache);
        list.load_cached().await;
        list.load_page(1).await.unwrap();

        assert_eq!(ids(&list), vec![30, 3, 2, 1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
