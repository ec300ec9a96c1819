//! Request extractors whose rejections use the failure envelope instead of axum's plain-text
//! bodies. Parser output is logged at debug level and never returned to the client.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::envelope::ApiError;
use crate::validation::ValidationErrors;

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Deserialized query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

/// Path parameters; a malformed identifier is reported as a missing record.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(request, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(ApiError::from)
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(ApiError::from)
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(ApiError::from)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "json body rejected");
        let errors = match &rejection {
            JsonRejection::JsonDataError(_) => data_errors(&rejection.body_text()),
            JsonRejection::JsonSyntaxError(_) => {
                ValidationErrors::single("body", "the request body is not valid JSON")
            }
            JsonRejection::MissingJsonContentType(_) => ValidationErrors::single(
                "body",
                "the request body must be sent as application/json",
            ),
            _ => ValidationErrors::single("body", "the request body could not be read"),
        };
        ApiError::validation(errors)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(detail = %rejection.body_text(), "query string rejected");
        ApiError::validation(ValidationErrors::single(
            "query",
            "the query string contains an invalid value",
        ))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(detail = %rejection.body_text(), "path parameters rejected");
        ApiError::not_found("the requested record was not found")
    }
}

/// Turns a typed-data failure into a message keyed by the offending field.
///
/// The text has the form `<prefix><path>: <serde message>`, or `<prefix><serde message>` when
/// the failure sits at the top level (e.g. a missing field).
fn data_errors(text: &str) -> ValidationErrors {
    let detail = text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(text);

    if let Some(field) = missing_field(detail) {
        let message = format!("the {field} field is required");
        return ValidationErrors::single(field, message);
    }

    match detail.split_once(": ") {
        Some((path, reason)) if is_field_path(path) => {
            let message = if reason.starts_with("unknown variant") {
                format!("the selected {path} is invalid")
            } else {
                format!("the {path} field is invalid")
            };
            ValidationErrors::single(path.to_string(), message)
        }
        _ => ValidationErrors::single("body", "the request body does not match the expected shape"),
    }
}

fn missing_field(detail: &str) -> Option<String> {
    let rest = detail.strip_prefix("missing field `")?;
    let (field, _) = rest.split_once('`')?;
    Some(field.to_string())
}

fn is_field_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}
