//! Background feed poller for Newsdesk.
//!
//! Periodically ingests every active newsletter with a feed URL and
//! unpublishes articles whose visibility window has closed.

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::article::ArticleRepository;
use crate::db::Database;
use crate::newsletter::NewsletterRepository;
use crate::rss::ingest::IngestService;

/// Default poll interval in seconds (15 minutes).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;

/// Result of one polling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Newsletters whose feed was fetched successfully.
    pub polled: usize,
    /// Newsletters whose feed failed.
    pub failed: usize,
    /// Articles created.
    pub created: usize,
    /// Articles unpublished because `publish_until` passed.
    pub expired: u64,
}

/// Feed background poller.
pub struct FeedPoller {
    db: Database,
    ingest: IngestService,
    poll_interval: Duration,
}

impl FeedPoller {
    /// Create a poller with the default interval.
    pub fn new(db: Database, ingest: IngestService) -> Self {
        Self::with_interval(db, ingest, DEFAULT_POLL_INTERVAL_SECS)
    }

    /// Create a poller with a custom interval.
    pub fn with_interval(db: Database, ingest: IngestService, interval_secs: u64) -> Self {
        Self {
            db,
            ingest,
            poll_interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run the polling loop forever.
    ///
    /// The first pass runs immediately.
    pub async fn run(&self) {
        info!(
            "Feed poller started (interval: {} seconds)",
            self.poll_interval.as_secs()
        );

        let mut timer = interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.poll_once().await;
        }
    }

    /// Run a single pass: ingest all pollable newsletters, then expire
    /// articles.
    pub async fn poll_once(&self) -> PollSummary {
        let mut summary = PollSummary::default();

        let newsletters = match NewsletterRepository::new(self.db.pool())
            .list_pollable()
            .await
        {
            Ok(newsletters) => newsletters,
            Err(e) => {
                error!("Failed to list newsletters for polling: {}", e);
                Vec::new()
            }
        };

        debug!("Polling {} newsletter feed(s)", newsletters.len());
        for newsletter in &newsletters {
            match self.ingest.ingest_newsletter(newsletter).await {
                Ok(created) => {
                    summary.polled += 1;
                    summary.created += created.len();
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        "Failed to poll newsletter {} ({}): {}",
                        newsletter.id, newsletter.name, e
                    );
                }
            }
        }

        match ArticleRepository::new(self.db.pool())
            .unpublish_expired(Utc::now())
            .await
        {
            Ok(expired) => {
                if expired > 0 {
                    info!("Unpublished {} expired article(s)", expired);
                }
                summary.expired = expired;
            }
            Err(e) => error!("Failed to unpublish expired articles: {}", e),
        }

        summary
    }
}

/// Spawn the poller as a background task.
pub fn start_feed_poller(poller: FeedPoller) -> JoinHandle<()> {
    tokio::spawn(async move {
        poller.run().await;
    })
}
