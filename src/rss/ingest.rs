//! Feed ingestion service for Newsdesk.
//!
//! Turns feed entries into articles, de-duplicated by the
//! `(newsletter_id, external_id)` pair, and announces every created article to
//! the connected clients.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::article::{Article, ArticleRepository};
use crate::config::RssConfig;
use crate::db::Database;
use crate::newsletter::{NewNewsletter, Newsletter, NewsletterRepository};
use crate::notify::{Broadcaster, ServerEvent};
use crate::rss::fetcher::FeedFetcher;
use crate::rss::opml::parse_opml;
use crate::rss::types::{ImportFailure, ImportReport, OpmlSubscription, ParsedFeed};
use crate::{NewsdeskError, Result};

/// Domain used for the placeholder email of OPML-imported newsletters.
const OPML_EMAIL_DOMAIN: &str = "opml.invalid";

/// Feed ingestion service.
#[derive(Clone)]
pub struct IngestService {
    db: Database,
    fetcher: FeedFetcher,
    broadcaster: Arc<Broadcaster>,
    max_items_per_feed: usize,
}

impl IngestService {
    /// Create a new ingestion service.
    pub fn new(
        db: Database,
        fetcher: FeedFetcher,
        broadcaster: Arc<Broadcaster>,
        max_items_per_feed: usize,
    ) -> Self {
        Self {
            db,
            fetcher,
            broadcaster,
            max_items_per_feed,
        }
    }

    /// Create a service whose fetcher follows the feed configuration.
    pub fn from_config(
        db: Database,
        config: &RssConfig,
        broadcaster: Arc<Broadcaster>,
    ) -> Result<Self> {
        let fetcher = FeedFetcher::new(config)?;
        Ok(Self::new(db, fetcher, broadcaster, config.max_items_per_feed))
    }

    /// The broadcaster that receives `NEW_ARTICLE` events.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Fetch a newsletter's feed and store its new entries.
    ///
    /// Returns the articles created, in feed-entry order.
    pub async fn ingest_newsletter(&self, newsletter: &Newsletter) -> Result<Vec<Article>> {
        let url = newsletter.feed_url().ok_or_else(|| {
            NewsdeskError::Validation(format!(
                "newsletter {} has no feed URL",
                newsletter.id
            ))
        })?;

        let feed = self.fetcher.fetch(url).await?;
        self.store_entries(newsletter.id, &feed).await
    }

    /// Store the entries of an already fetched feed.
    ///
    /// Entries without a title are skipped. Entries whose external ID is
    /// already recorded for the newsletter are left untouched. One
    /// `NEW_ARTICLE` event is broadcast per created article.
    pub async fn store_entries(&self, newsletter_id: i64, feed: &ParsedFeed) -> Result<Vec<Article>> {
        let repo = ArticleRepository::new(self.db.pool());
        let mut created = Vec::new();

        for entry in feed.entries.iter().take(self.max_items_per_feed) {
            let Some(new_article) = entry.to_new_article(newsletter_id) else {
                debug!(
                    "Skipping entry {} of newsletter {}: missing title",
                    entry.external_id, newsletter_id
                );
                continue;
            };

            let Some(id) = repo.create_or_ignore(&new_article).await? else {
                continue;
            };
            let article = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| NewsdeskError::NotFound("article".into()))?;

            self.broadcaster
                .broadcast(&ServerEvent::new_article(article.clone()))
                .await;
            created.push(article);
        }

        if created.is_empty() {
            debug!("Newsletter {}: no new articles", newsletter_id);
        } else {
            info!(
                "Newsletter {}: {} new article(s)",
                newsletter_id,
                created.len()
            );
        }
        Ok(created)
    }

    /// Import an OPML subscription list.
    ///
    /// Each subscription is fetched first; a subscription whose feed cannot
    /// be fetched or parsed is reported as a failure and does not affect the
    /// others. Reachable subscriptions are upserted by feed URL and ingested.
    /// Only a document that is not OPML at all fails the whole call.
    pub async fn import_opml(&self, document: &str) -> Result<ImportReport> {
        let subscriptions = parse_opml(document)?;
        info!("Importing {} OPML subscription(s)", subscriptions.len());

        let mut report = ImportReport::default();
        for subscription in subscriptions {
            match self.import_subscription(&subscription).await {
                Ok((newsletter, created)) => {
                    report.articles_created += created;
                    report.imported.push(newsletter);
                }
                Err(e) => {
                    warn!(
                        "Failed to import {} ({}): {}",
                        subscription.name, subscription.rss_url, e
                    );
                    report.failures.push(ImportFailure {
                        name: subscription.name,
                        url: subscription.rss_url,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "OPML import finished: {} imported, {} failed, {} new article(s)",
            report.imported.len(),
            report.failures.len(),
            report.articles_created
        );
        Ok(report)
    }

    async fn import_subscription(
        &self,
        subscription: &OpmlSubscription,
    ) -> Result<(Newsletter, usize)> {
        let feed = self.fetcher.fetch(&subscription.rss_url).await?;
        let newsletter = self.upsert_subscription(subscription).await?;
        let created = self.store_entries(newsletter.id, &feed).await?;
        Ok((newsletter, created.len()))
    }

    /// Create the newsletter for a subscription, or rename the existing one.
    async fn upsert_subscription(&self, subscription: &OpmlSubscription) -> Result<Newsletter> {
        let repo = NewsletterRepository::new(self.db.pool());

        if let Some(existing) = repo.get_by_rss_url(&subscription.rss_url).await? {
            if existing.name == subscription.name {
                return Ok(existing);
            }
            repo.update_name(existing.id, &subscription.name).await?;
            return repo
                .get_by_id(existing.id)
                .await?
                .ok_or_else(|| NewsdeskError::NotFound("newsletter".into()));
        }

        let email = placeholder_email(&subscription.rss_url);
        let new = NewNewsletter::new(&subscription.name, &email).with_rss_url(&subscription.rss_url);
        match repo.create(&new).await {
            Ok(newsletter) => Ok(newsletter),
            // The placeholder is taken by a newsletter whose feed URL was edited since
            Err(NewsdeskError::Conflict(_)) => repo
                .get_by_email(&email)
                .await?
                .ok_or_else(|| NewsdeskError::NotFound("newsletter".into())),
            Err(e) => Err(e),
        }
    }
}

/// Deterministic placeholder email for a feed URL.
pub fn placeholder_email(rss_url: &str) -> String {
    let digest = Sha256::digest(rss_url.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("feed-{}@{}", hex, OPML_EMAIL_DOMAIN)
}
