//! Article repository for Newsdesk.

use chrono::{DateTime, Utc};

use super::types::{page_offset, Article, ArticlePage, NewArticle, PAGE_SIZE};
use crate::db::{format_timestamp, parse_datetime, DbPool, SQL_FALSE, SQL_TRUE};
use crate::{NewsdeskError, Result};

const ARTICLE_COLUMNS: &str = "id, title, content, thumbnail_url, newsletter_id, published, \
     published_at, publish_until, archived, external_id, link";

/// Row type for article from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    thumbnail_url: Option<String>,
    newsletter_id: Option<i64>,
    published: bool,
    published_at: Option<String>,
    publish_until: Option<String>,
    archived: bool,
    external_id: Option<String>,
    link: Option<String>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            content: row.content,
            thumbnail_url: row.thumbnail_url,
            newsletter_id: row.newsletter_id,
            published: row.published,
            published_at: row.published_at.and_then(|s| parse_datetime(&s)),
            publish_until: row.publish_until.and_then(|s| parse_datetime(&s)),
            archived: row.archived,
            external_id: row.external_id,
            link: row.link,
        }
    }
}

/// Repository for article operations.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new article.
    pub async fn create(&self, article: &NewArticle) -> Result<Article> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO articles (title, content, thumbnail_url, newsletter_id, published_at, external_id, link)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.thumbnail_url)
        .bind(article.newsletter_id)
        .bind(article.published_at.as_ref().map(format_timestamp))
        .bind(&article.external_id)
        .bind(&article.link)
        .fetch_one(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NewsdeskError::NotFound("article".into()))
    }

    /// Create a new article, ignoring it if the (newsletter_id, external_id)
    /// pair is already recorded.
    ///
    /// Returns the new ID, or `None` if the article already existed.
    pub async fn create_or_ignore(&self, article: &NewArticle) -> Result<Option<i64>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles (title, content, thumbnail_url, newsletter_id, published_at, external_id, link)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.thumbnail_url)
        .bind(article.newsletter_id)
        .bind(article.published_at.as_ref().map(format_timestamp))
        .bind(&article.external_id)
        .bind(&article.link)
        .execute(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    /// Get an article by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// List one page of articles (newest first, 1-based page number).
    ///
    /// The ordering is by ID so that sequential pages never repeat an
    /// article while the listing is unchanged.
    pub async fn list_page(&self, page: u32) -> Result<ArticlePage> {
        let total_count = self.count().await?;
        let offset = page_offset(page);

        let query = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(PAGE_SIZE as i64)
            .bind(offset as i64)
            .fetch_all(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        let articles: Vec<Article> = rows.into_iter().map(Article::from).collect();
        let has_more = (offset + articles.len()) < total_count as usize;

        Ok(ArticlePage {
            articles,
            total_count,
            has_more,
        })
    }

    /// List the articles currently visible in the outbound feed.
    ///
    /// Visible means published, not archived and not past its expiry at
    /// `now`. Most recently published first, at most `limit` articles.
    pub async fn list_feed(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Article>> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE published = {t} AND archived = {f}
              AND (publish_until IS NULL OR publish_until > $1)
            ORDER BY published_at DESC, id DESC
            LIMIT $2
            "#,
            t = SQL_TRUE,
            f = SQL_FALSE
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(format_timestamp(&now))
            .bind(limit as i64)
            .fetch_all(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Flip the published flag. Publishing stamps `published_at` with `now`.
    pub async fn toggle_published(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Article>> {
        let query = format!(
            r#"
            UPDATE articles
            SET published = CASE WHEN published = {f} THEN {t} ELSE {f} END,
                published_at = CASE WHEN published = {f} THEN $1 ELSE published_at END
            WHERE id = $2
            "#,
            t = SQL_TRUE,
            f = SQL_FALSE
        );
        let result = sqlx::query(&query)
            .bind(format_timestamp(&now))
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Flip the archived flag.
    pub async fn toggle_archived(&self, id: i64) -> Result<Option<Article>> {
        let query = format!(
            "UPDATE articles SET archived = CASE WHEN archived = {f} THEN {t} ELSE {f} END WHERE id = $1",
            t = SQL_TRUE,
            f = SQL_FALSE
        );
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Set or clear the visibility expiry.
    pub async fn set_publish_until(
        &self,
        id: i64,
        publish_until: Option<DateTime<Utc>>,
    ) -> Result<Option<Article>> {
        let result = sqlx::query("UPDATE articles SET publish_until = $1 WHERE id = $2")
            .bind(publish_until.as_ref().map(format_timestamp))
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Unpublish every published article whose expiry is at or before `now`.
    ///
    /// Returns the number of articles unpublished.
    pub async fn unpublish_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let query = format!(
            r#"
            UPDATE articles
            SET published = {f}
            WHERE published = {t} AND publish_until IS NOT NULL AND publish_until <= $1
            "#,
            t = SQL_TRUE,
            f = SQL_FALSE
        );
        let result = sqlx::query(&query)
            .bind(format_timestamp(&now))
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Count all articles.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(count.0)
    }

    /// Count articles of a newsletter.
    pub async fn count_by_newsletter(&self, newsletter_id: i64) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE newsletter_id = $1")
                .bind(newsletter_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
