//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_newsletter, delete_newsletter, fetch_newsletter_feed, get_article, import_opml,
    list_articles, list_newsletters, rss_feed, toggle_archive, toggle_publish, update_article,
    update_newsletter_status, AppState,
};
use super::middleware::create_cors_layer;
use super::ws::notifications_ws_handler;

/// Create the main API router.
///
/// Serves the REST API under `/api` and the notification socket at `/ws`.
/// The collection routes also answer with a trailing slash.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let article_routes = Router::new()
        .route("/", get(list_articles))
        .route("/:id", get(get_article).patch(update_article))
        .route("/:id/publish", post(toggle_publish))
        .route("/:id/archive", post(toggle_archive));

    let newsletter_routes = Router::new()
        .route("/", get(list_newsletters).post(create_newsletter))
        .route(
            "/import-opml",
            post(import_opml).layer(DefaultBodyLimit::max(app_state.max_upload_bytes)),
        )
        .route("/:id", delete(delete_newsletter))
        .route("/:id/status", patch(update_newsletter_status))
        .route("/:id/fetch-rss", post(fetch_newsletter_feed));

    let api_routes = Router::new()
        .route("/articles/", get(list_articles))
        .route("/newsletters/", get(list_newsletters).post(create_newsletter))
        .route("/rss", get(rss_feed))
        .nest("/articles", article_routes)
        .nest("/newsletters", newsletter_routes);

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(notifications_ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
