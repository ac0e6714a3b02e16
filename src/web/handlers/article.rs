//! Article handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::article::{Article, ArticlePage, ArticleRepository};
use crate::web::dto::{PageQuery, UpdateArticleRequest};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/articles?page=N - List one page of articles, newest first.
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ArticlePage>, ApiError> {
    let page = ArticleRepository::new(state.db.pool())
        .list_page(query.page)
        .await?;

    Ok(Json(page))
}

/// GET /api/articles/:id - Get a single article.
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    let article = ArticleRepository::new(state.db.pool())
        .get_by_id(article_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(article))
}

/// POST /api/articles/:id/publish - Toggle the published flag.
pub async fn toggle_publish(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    let article = ArticleRepository::new(state.db.pool())
        .toggle_published(article_id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    tracing::info!(
        article_id = article.id,
        published = article.published,
        "Article publish state changed"
    );
    Ok(Json(article))
}

/// PATCH /api/articles/:id - Set or clear the publish expiry.
///
/// A body without `publishUntil` leaves the article unchanged.
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i64>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    let repo = ArticleRepository::new(state.db.pool());
    let article = match req.publish_until {
        Some(publish_until) => repo.set_publish_until(article_id, publish_until).await?,
        None => repo.get_by_id(article_id).await?,
    }
    .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(article))
}

/// POST /api/articles/:id/archive - Toggle the archived flag.
pub async fn toggle_archive(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    let article = ArticleRepository::new(state.db.pool())
        .toggle_archived(article_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(article))
}
