//! Configuration module for Newsdesk.

use serde::Deserialize;
use std::path::Path;

use crate::{NewsdeskError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum accepted size of an OPML upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/newsdesk.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsdesk.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Feed ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RssConfig {
    /// Whether background polling is enabled.
    #[serde(default = "default_rss_enabled")]
    pub enabled: bool,
    /// Poll interval in seconds.
    #[serde(default = "default_rss_poll_interval")]
    pub poll_interval_secs: u64,
    /// Maximum feed size in bytes.
    #[serde(default = "default_rss_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum entries considered per fetch.
    #[serde(default = "default_rss_max_items")]
    pub max_items_per_feed: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_rss_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_rss_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_rss_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_rss_max_redirects")]
    pub max_redirects: usize,
    /// Allow feeds on loopback and private networks.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_rss_enabled() -> bool {
    true
}

fn default_rss_poll_interval() -> u64 {
    900 // 15 minutes
}

fn default_rss_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_rss_max_items() -> usize {
    100
}

fn default_rss_connect_timeout() -> u64 {
    10
}

fn default_rss_read_timeout() -> u64 {
    20
}

fn default_rss_total_timeout() -> u64 {
    30
}

fn default_rss_max_redirects() -> usize {
    5
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: default_rss_enabled(),
            poll_interval_secs: default_rss_poll_interval(),
            max_feed_size_bytes: default_rss_max_feed_size(),
            max_items_per_feed: default_rss_max_items(),
            connect_timeout_secs: default_rss_connect_timeout(),
            read_timeout_secs: default_rss_read_timeout(),
            total_timeout_secs: default_rss_total_timeout(),
            max_redirects: default_rss_max_redirects(),
            allow_private_hosts: false,
        }
    }
}

/// Real-time notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Queued messages per connected client before it is dropped.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
}

fn default_client_buffer() -> usize {
    64
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            client_buffer: default_client_buffer(),
        }
    }
}

/// Client toolkit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Newsdesk server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Path to the offline article cache.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// Request timeout in seconds.
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_cache_path() -> String {
    "data/ArticlesDB".to_string()
}

fn default_client_timeout() -> u64 {
    15
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            cache_path: default_cache_path(),
            timeout_secs: default_client_timeout(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed ingestion configuration.
    #[serde(default)]
    pub rss: RssConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Client toolkit configuration.
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NewsdeskError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NewsdeskError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NEWSDESK_DATABASE_PATH`: Override the database path
    /// - `NEWSDESK_PORT`: Override the listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NEWSDESK_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(port) = std::env::var("NEWSDESK_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid NEWSDESK_PORT value: {}", port),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.rss.enabled && self.rss.poll_interval_secs == 0 {
            return Err(NewsdeskError::Config(
                "rss.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.notify.client_buffer == 0 {
            return Err(NewsdeskError::Config(
                "notify.client_buffer must be greater than 0".to_string(),
            ));
        }
        if self.database.path.is_empty() {
            return Err(NewsdeskError::Config(
                "database.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.server.max_upload_bytes, 1024 * 1024);

        assert_eq!(config.database.path, "data/newsdesk.db");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/newsdesk.log");

        assert!(config.rss.enabled);
        assert_eq!(config.rss.poll_interval_secs, 900);
        assert_eq!(config.rss.max_feed_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.rss.max_items_per_feed, 100);
        assert_eq!(config.rss.connect_timeout_secs, 10);
        assert_eq!(config.rss.read_timeout_secs, 20);
        assert_eq!(config.rss.total_timeout_secs, 30);
        assert_eq!(config.rss.max_redirects, 5);
        assert!(!config.rss.allow_private_hosts);

        assert_eq!(config.notify.client_buffer, 64);

        assert_eq!(config.client.server_url, "http://127.0.0.1:8080");
        assert_eq!(config.client.cache_path, "data/ArticlesDB");
        assert_eq!(config.client.timeout_secs, 15);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173"]
max_upload_bytes = 2048

[database]
path = "custom/db.sqlite"

[logging]
level = "debug"
file = "custom/logs/app.log"

[rss]
enabled = false
poll_interval_secs = 60
max_feed_size_bytes = 1048576
max_items_per_feed = 20
connect_timeout_secs = 5
read_timeout_secs = 6
total_timeout_secs = 7
max_redirects = 2
allow_private_hosts = true

[notify]
client_buffer = 8

[client]
server_url = "http://news.example.com"
cache_path = "cache/articles.db"
timeout_secs = 3
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.server.max_upload_bytes, 2048);

        assert_eq!(config.database.path, "custom/db.sqlite");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");

        assert!(!config.rss.enabled);
        assert_eq!(config.rss.poll_interval_secs, 60);
        assert_eq!(config.rss.max_feed_size_bytes, 1048576);
        assert_eq!(config.rss.max_items_per_feed, 20);
        assert_eq!(config.rss.connect_timeout_secs, 5);
        assert_eq!(config.rss.read_timeout_secs, 6);
        assert_eq!(config.rss.total_timeout_secs, 7);
        assert_eq!(config.rss.max_redirects, 2);
        assert!(config.rss.allow_private_hosts);

        assert_eq!(config.notify.client_buffer, 8);

        assert_eq!(config.client.server_url, "http://news.example.com");
        assert_eq!(config.client.cache_path, "cache/articles.db");
        assert_eq!(config.client.timeout_secs, 3);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, "data/newsdesk.db");
        assert_eq!(config.notify.client_buffer, 64);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/newsdesk.db");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(NewsdeskError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(NewsdeskError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rss]\nmax_items_per_feed = 7\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rss.max_items_per_feed, 7);
    }

    // Both env variables are exercised in one test so parallel tests never race on them.
    #[test]
    fn test_apply_env_overrides() {
        let original_path = std::env::var("NEWSDESK_DATABASE_PATH").ok();
        let original_port = std::env::var("NEWSDESK_PORT").ok();

        std::env::set_var("NEWSDESK_DATABASE_PATH", "env/newsdesk.db");
        std::env::set_var("NEWSDESK_PORT", "9191");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.database.path, "env/newsdesk.db");
        assert_eq!(config.server.port, 9191);

        std::env::set_var("NEWSDESK_DATABASE_PATH", "");
        std::env::set_var("NEWSDESK_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.database.path, "data/newsdesk.db");
        assert_eq!(config.server.port, 8080);

        match original_path {
            Some(val) => std::env::set_var("NEWSDESK_DATABASE_PATH", val),
            None => std::env::remove_var("NEWSDESK_DATABASE_PATH"),
        }
        match original_port {
            Some(val) => std::env::set_var("NEWSDESK_PORT", val),
            None => std::env::remove_var("NEWSDESK_PORT"),
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.rss.poll_interval_secs = 0;

        let result = config.validate();
        assert!(matches!(result, Err(NewsdeskError::Config(msg)) if msg.contains("poll_interval")));

        config.rss.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_client_buffer() {
        let mut config = Config::default();
        config.notify.client_buffer = 0;
        assert!(config.validate().is_err());
    }
}
