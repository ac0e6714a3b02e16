//! Database schema and migrations for Newsdesk.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Newsletters
    r#"
CREATE TABLE newsletters (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    rss_url     TEXT,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_newsletters_rss_url ON newsletters(rss_url);
"#,
    // v2: Articles
    r#"
CREATE TABLE articles (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    content         TEXT NOT NULL DEFAULT '',
    thumbnail_url   TEXT,
    newsletter_id   INTEGER REFERENCES newsletters(id) ON DELETE SET NULL,
    published       INTEGER NOT NULL DEFAULT 0,
    published_at    TEXT,                   -- RFC 3339
    publish_until   TEXT,                   -- RFC 3339, visibility expiry
    archived        INTEGER NOT NULL DEFAULT 0,
    external_id     TEXT,                   -- feed entry id, de-duplication key
    link            TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Manually created articles (no external_id) are exempt from de-duplication
CREATE UNIQUE INDEX idx_articles_newsletter_external
    ON articles(newsletter_id, external_id)
    WHERE external_id IS NOT NULL;
CREATE INDEX idx_articles_publish_until ON articles(publish_until);
"#,
];
