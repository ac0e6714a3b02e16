use std::sync::Arc;

use tracing::{error, info};

use newsdesk::notify::Broadcaster;
use newsdesk::rss::{start_feed_poller, FeedPoller, IngestService};
use newsdesk::web::WebServer;
use newsdesk::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = newsdesk::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        newsdesk::logging::init_console_only(&config.logging.level);
    }

    info!("Newsdesk - newsletter aggregator");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> newsdesk::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let broadcaster = Arc::new(Broadcaster::with_buffer(config.notify.client_buffer));
    let ingest = IngestService::from_config(db.clone(), &config.rss, broadcaster)?;

    if config.rss.enabled {
        let poller =
            FeedPoller::with_interval(db.clone(), ingest.clone(), config.rss.poll_interval_secs);
        start_feed_poller(poller);
    } else {
        info!("Feed polling disabled");
    }

    let server = WebServer::new(&config.server, db, ingest)?;
    info!("Server configured on {}", server.addr());
    server.run().await?;
    Ok(())
}
