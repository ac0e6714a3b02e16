//! Newsletter repository for Newsdesk.

use super::types::{NewNewsletter, Newsletter};
use crate::db::{DbPool, SQL_TRUE};
use crate::{NewsdeskError, Result};

/// Row type for newsletter from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct NewsletterRow {
    id: i64,
    name: String,
    email: String,
    rss_url: Option<String>,
    active: bool,
}

impl From<NewsletterRow> for Newsletter {
    fn from(row: NewsletterRow) -> Self {
        Newsletter {
            id: row.id,
            name: row.name,
            email: row.email,
            rss_url: row.rss_url,
            active: row.active,
        }
    }
}

fn map_write_error(e: sqlx::Error, email: &str) -> NewsdeskError {
    let unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        NewsdeskError::Conflict(format!("email {email} is already registered"))
    } else {
        NewsdeskError::Database(e.to_string())
    }
}

/// Repository for newsletter operations.
pub struct NewsletterRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> NewsletterRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new newsletter.
    ///
    /// Returns `Conflict` if the email is already registered.
    pub async fn create(&self, newsletter: &NewNewsletter) -> Result<Newsletter> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO newsletters (name, email, rss_url, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&newsletter.name)
        .bind(&newsletter.email)
        .bind(&newsletter.rss_url)
        .bind(newsletter.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, &newsletter.email))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NewsdeskError::NotFound("newsletter".into()))
    }

    /// Get a newsletter by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Newsletter>> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            "SELECT id, name, email, rss_url, active FROM newsletters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(row.map(Newsletter::from))
    }

    /// Get the oldest newsletter subscribed to a feed URL.
    pub async fn get_by_rss_url(&self, rss_url: &str) -> Result<Option<Newsletter>> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            r#"
            SELECT id, name, email, rss_url, active
            FROM newsletters
            WHERE rss_url = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(rss_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(row.map(Newsletter::from))
    }

    /// Get a newsletter by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Newsletter>> {
        let row = sqlx::query_as::<_, NewsletterRow>(
            "SELECT id, name, email, rss_url, active FROM newsletters WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(row.map(Newsletter::from))
    }

    /// List all newsletters (ordered by registration order).
    pub async fn list_all(&self) -> Result<Vec<Newsletter>> {
        let rows = sqlx::query_as::<_, NewsletterRow>(
            "SELECT id, name, email, rss_url, active FROM newsletters ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Newsletter::from).collect())
    }

    /// List active newsletters that have a feed URL.
    pub async fn list_pollable(&self) -> Result<Vec<Newsletter>> {
        let query = format!(
            r#"
            SELECT id, name, email, rss_url, active
            FROM newsletters
            WHERE active = {} AND rss_url IS NOT NULL AND TRIM(rss_url) <> ''
            ORDER BY id ASC
            "#,
            SQL_TRUE
        );
        let rows = sqlx::query_as::<_, NewsletterRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Newsletter::from).collect())
    }

    /// Set the active flag.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE newsletters SET active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Rename a newsletter.
    pub async fn update_name(&self, id: i64, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE newsletters SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a newsletter. Its articles are kept and detached.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM newsletters WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all newsletters.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM newsletters")
            .fetch_one(self.pool)
            .await
            .map_err(|e| NewsdeskError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
