//! Request validation for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// A body that is not valid JSON for `T` is a 400; a body that breaks a
/// field rule is a 422 with the offending fields listed in `details`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(ValidatedJson(value))
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Reject control characters other than tab, CR and LF.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    let has_control = value
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));
    if has_control {
        return Err(rule("no_control_chars", "Must not contain control characters"));
    }
    Ok(())
}

/// Reject values that are blank once trimmed.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("not_empty_trimmed", "Must not be empty"));
    }
    Ok(())
}

/// Validate that a feed URL is an absolute http(s) URL.
///
/// A blank value is accepted and means "no feed".
pub fn http_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let is_http = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false);
    if !is_http {
        return Err(rule("http_url", "Must be an http or https URL"));
    }
    Ok(())
}
