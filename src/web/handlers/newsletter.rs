//! Newsletter handlers for Web API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::article::{Article, ArticleRepository};
use crate::newsletter::{NewNewsletter, Newsletter, NewsletterRepository};
use crate::rss::ImportReport;
use crate::web::dto::{CreateNewsletterRequest, DeleteResponse, UpdateStatusRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Multipart field carrying the OPML document.
const OPML_FIELD: &str = "file";

/// GET /api/newsletters - List all newsletters.
pub async fn list_newsletters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Newsletter>>, ApiError> {
    let newsletters = NewsletterRepository::new(state.db.pool()).list_all().await?;
    Ok(Json(newsletters))
}

/// POST /api/newsletters - Register a newsletter.
pub async fn create_newsletter(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateNewsletterRequest>,
) -> Result<(StatusCode, Json<Newsletter>), ApiError> {
    let mut new = NewNewsletter::new(req.name.trim(), req.email.trim());
    if let Some(url) = req.rss_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        new = new.with_rss_url(url);
    }

    let newsletter = NewsletterRepository::new(state.db.pool())
        .create(&new)
        .await?;

    tracing::info!(
        newsletter_id = newsletter.id,
        name = %newsletter.name,
        "Newsletter registered"
    );
    Ok((StatusCode::CREATED, Json(newsletter)))
}

/// PATCH /api/newsletters/:id/status - Activate or deactivate a newsletter.
pub async fn update_newsletter_status(
    State(state): State<Arc<AppState>>,
    Path(newsletter_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Newsletter>, ApiError> {
    let repo = NewsletterRepository::new(state.db.pool());
    if !repo.set_active(newsletter_id, req.active).await? {
        return Err(ApiError::not_found("Newsletter not found"));
    }

    let newsletter = repo
        .get_by_id(newsletter_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Newsletter not found"))?;

    Ok(Json(newsletter))
}

/// POST /api/newsletters/:id/fetch-rss - Fetch the newsletter feed now.
///
/// Returns the articles created by this fetch.
pub async fn fetch_newsletter_feed(
    State(state): State<Arc<AppState>>,
    Path(newsletter_id): Path<i64>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let newsletter = NewsletterRepository::new(state.db.pool())
        .get_by_id(newsletter_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Newsletter not found"))?;

    if newsletter.feed_url().is_none() {
        return Err(ApiError::unprocessable("Newsletter has no RSS URL"));
    }

    let created = state.ingest.ingest_newsletter(&newsletter).await?;
    Ok(Json(created))
}

/// DELETE /api/newsletters/:id - Delete a newsletter.
///
/// Its articles are kept and detached.
pub async fn delete_newsletter(
    State(state): State<Arc<AppState>>,
    Path(newsletter_id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let detached = ArticleRepository::new(state.db.pool())
        .count_by_newsletter(newsletter_id)
        .await?;
    let deleted = NewsletterRepository::new(state.db.pool())
        .delete(newsletter_id)
        .await?;

    if !deleted {
        return Err(ApiError::not_found("Newsletter not found"));
    }

    tracing::info!(newsletter_id, detached, "Newsletter deleted");
    Ok(Json(DeleteResponse::new(newsletter_id)))
}

/// POST /api/newsletters/import-opml - Import an OPML subscription list.
///
/// Expects the document in the multipart field `file`.
pub async fn import_opml(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, ApiError> {
    let mut document: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(OPML_FIELD) {
            continue;
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::unprocessable("OPML file must be UTF-8 encoded"))?;
        document = Some(text);
        break;
    }

    let document =
        document.ok_or_else(|| ApiError::bad_request("Missing multipart field \"file\""))?;

    let report = state.ingest.import_opml(&document).await?;
    Ok(Json(report))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("OPML file is too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}
