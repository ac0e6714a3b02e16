//! Outbound RSS feed handler.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
};
use chrono::Utc;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::sync::Arc;

use crate::article::{Article, ArticleRepository};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Maximum number of items in the outbound feed.
pub const FEED_ITEM_LIMIT: usize = 50;

const FEED_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// GET /api/rss - Published articles as an RSS 2.0 feed.
pub async fn rss_feed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let articles = ArticleRepository::new(state.db.pool())
        .list_feed(Utc::now(), FEED_ITEM_LIMIT)
        .await?;

    let base_url = request_base_url(&headers);
    let items: Vec<Item> = articles
        .iter()
        .map(|article| feed_item(article, &base_url))
        .collect();

    let channel = ChannelBuilder::default()
        .title("Newsdesk")
        .link(base_url.clone())
        .description("Published articles")
        .items(items)
        .build();

    Ok(([(header::CONTENT_TYPE, FEED_CONTENT_TYPE)], channel.to_string()))
}

fn feed_item(article: &Article, base_url: &str) -> Item {
    let api_url = format!("{}/api/articles/{}", base_url, article.id);
    let guid = GuidBuilder::default()
        .value(api_url.clone())
        .permalink(false)
        .build();

    ItemBuilder::default()
        .title(Some(article.title.clone()))
        .link(Some(article.link.clone().unwrap_or(api_url)))
        .description(Some(article.content.clone()))
        .guid(Some(guid))
        .pub_date(article.published_at.map(|at| at.to_rfc2822()))
        .build()
}

/// `http://<Host>` of the request, for absolute links in the feed.
fn request_base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .unwrap_or("localhost");
    format!("http://{}", host)
}
