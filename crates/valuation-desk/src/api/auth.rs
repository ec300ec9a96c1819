use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::envelope::ApiError;
use crate::identity::Caller;
use crate::store::RepositoryError;

/// Resolves an opaque bearer token, issued elsewhere, to the calling staff member.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Option<Caller>, RepositoryError>;
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware attaching a [`Caller`] extension to every authenticated request.
pub async fn authenticate<P>(
    State(provider): State<Arc<P>>,
    mut request: Request,
    next: Next,
) -> Response
where
    P: IdentityProvider + 'static,
{
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return ApiError::unauthenticated("missing bearer token").into_response();
    };

    match provider.resolve(&token) {
        Ok(Some(caller)) if !caller.is_active => {
            ApiError::forbidden("this account is inactive").into_response()
        }
        Ok(Some(caller)) => {
            debug!(caller = %caller.id, "request authenticated");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Ok(None) => ApiError::unauthenticated("unknown or expired token").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
