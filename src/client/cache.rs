//! Offline article cache.
//!
//! A local SQLite database holding the last known state of every article the
//! client has seen, keyed by article ID. It lets the article list render
//! before (or without) a server round trip.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::article::Article;
use crate::{NewsdeskError, Result};

/// Cache schema version, stored in `PRAGMA user_version`.
pub const CACHE_SCHEMA_VERSION: i64 = 1;

const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id      INTEGER PRIMARY KEY,
    data    TEXT NOT NULL
);
"#;

/// Local article store.
#[derive(Clone)]
pub struct OfflineArticleCache {
    pool: SqlitePool,
}

impl OfflineArticleCache {
    /// Open (or create) the cache at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening offline article cache at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(cache_error)?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    /// Open an in-memory cache for testing.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(cache_error)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(cache_error)?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    async fn init_schema(&self) -> Result<()> {
        let version = self.schema_version().await?;
        if version >= CACHE_SCHEMA_VERSION {
            return Ok(());
        }

        debug!("Creating offline cache schema v{}", CACHE_SCHEMA_VERSION);
        sqlx::raw_sql(CACHE_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(cache_error)?;
        sqlx::raw_sql(&format!("PRAGMA user_version = {}", CACHE_SCHEMA_VERSION))
            .execute(&self.pool)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    /// Current cache schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .map_err(cache_error)
    }

    /// Store articles, replacing any previous copy with the same ID.
    ///
    /// All articles are written in one transaction. Articles without a
    /// positive ID are skipped. Returns the number written.
    pub async fn put(&self, articles: &[Article]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(cache_error)?;
        let mut written = 0;

        for article in articles {
            if article.id <= 0 {
                debug!("Skipping article without identity: {:?}", article.title);
                continue;
            }
            let data = serde_json::to_string(article)
                .map_err(|e| NewsdeskError::Cache(format!("failed to encode article: {}", e)))?;

            sqlx::query(
                "INSERT INTO articles (id, data) VALUES ($1, $2)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            )
            .bind(article.id)
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(cache_error)?;
            written += 1;
        }

        tx.commit().await.map_err(cache_error)?;
        Ok(written)
    }

    /// Every cached article, in no particular order.
    pub async fn get_all(&self) -> Result<Vec<Article>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT data FROM articles")
            .fetch_all(&self.pool)
            .await
            .map_err(cache_error)?;

        rows.into_iter()
            .map(|(data,)| {
                serde_json::from_str(&data).map_err(|e| {
                    NewsdeskError::Cache(format!("corrupt cached article: {}", e))
                })
            })
            .collect()
    }

    /// Remove every cached article.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM articles")
            .execute(&self.pool)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

fn cache_error(e: sqlx::Error) -> NewsdeskError {
    error!("Offline cache error: {}", e);
    NewsdeskError::Cache(e.to_string())
}
