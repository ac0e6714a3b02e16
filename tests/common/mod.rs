//! Test helpers for the HTTP API and ingestion tests.
//!
//! Provides an in-memory application, a local feed server and fixture
//! builders for RSS and OPML documents.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use axum::Router;
use axum_test::TestServer;
use tokio::net::TcpListener;

use newsdesk::config::RssConfig;
use newsdesk::notify::Broadcaster;
use newsdesk::rss::IngestService;
use newsdesk::web::handlers::AppState;
use newsdesk::web::router::create_router;
use newsdesk::Database;

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Address that refuses connections.
pub const UNREACHABLE_FEED: &str = "http://127.0.0.1:1/feed.xml";

/// Feed settings that allow fetching from the local feed server.
pub fn test_rss_config() -> RssConfig {
    RssConfig {
        allow_private_hosts: true,
        connect_timeout_secs: 2,
        read_timeout_secs: 2,
        total_timeout_secs: 5,
        ..Default::default()
    }
}

/// In-memory application wired the same way as the binary.
pub struct TestApp {
    pub db: Database,
    pub ingest: IngestService,
    pub broadcaster: Arc<Broadcaster>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let broadcaster = Arc::new(Broadcaster::new());
        let ingest = IngestService::from_config(db.clone(), &test_rss_config(), broadcaster.clone())
            .expect("Failed to create ingest service");

        Self {
            db,
            ingest,
            broadcaster,
        }
    }

    /// Router over this application's state.
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState::new(
            self.db.clone(),
            self.ingest.clone(),
            64 * 1024,
        ));
        create_router(state, &[])
    }

    /// axum-test server over this application's router.
    pub fn test_server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to create test server")
    }
}

/// Serve `(path, rss_body)` pairs on a random local port.
///
/// Unknown paths answer 404.
pub async fn start_feed_server(feeds: Vec<(&'static str, String)>) -> SocketAddr {
    let mut router = Router::new();
    for (path, body) in feeds {
        router = router.route(
            path,
            get(move || {
                let body = body.clone();
                async move { ([(CONTENT_TYPE, "application/rss+xml")], body) }
            }),
        );
    }

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind feed server");
    let addr = listener.local_addr().expect("Failed to get feed server addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// Build an RSS 2.0 document with `(guid, title)` items.
pub fn rss_feed(title: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(guid, item_title)| {
            format!(
                r#"
    <item>
      <title>{item_title}</title>
      <guid>{guid}</guid>
      <link>https://example.com/{guid}</link>
      <description>&lt;p&gt;Body of {item_title}&lt;/p&gt;&lt;img src="https://example.com/{guid}.jpg"&gt;</description>
      <pubDate>Mon, 06 May 2024 08:00:00 GMT</pubDate>
    </item>"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{title}</title>
    <link>https://example.com/</link>
    <description>{title} feed</description>{items}
  </channel>
</rss>"#
    )
}

/// Build an OPML document with `(name, url)` subscriptions.
pub fn opml_document(subscriptions: &[(&str, &str)]) -> String {
    let outlines: String = subscriptions
        .iter()
        .map(|(name, url)| {
            format!(r#"    <outline text="{name}" title="{name}" type="rss" xmlUrl="{url}"/>"#)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Subscriptions</title></head>
  <body>
{outlines}
  </body>
</opml>"#
    )
}
