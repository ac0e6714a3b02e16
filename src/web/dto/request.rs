//! Request DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::validation::{http_url, no_control_chars, not_empty_trimmed};

/// Newsletter registration request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsletterRequest {
    /// Display name.
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    /// Contact email.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// RSS/Atom feed URL (optional).
    #[serde(default)]
    #[validate(custom(function = "http_url"))]
    pub rss_url: Option<String>,
}

/// Newsletter status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New active flag.
    pub active: bool,
}

/// Article visibility window update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    /// Expiry of the published state.
    ///
    /// `None` when the field is absent (leave unchanged), `Some(None)` for
    /// an explicit `null` (clear it).
    #[serde(default, deserialize_with = "present")]
    pub publish_until: Option<Option<DateTime<Utc>>>,
}

/// Marks a field that appeared in the body, even as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Article listing query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}
