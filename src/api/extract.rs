//! Request extractors: caller identity, admin gate, validated JSON bodies and
//! `Path`/`Query` wrappers whose rejections use the error envelope.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::Owner;
use crate::error::ApiError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-user-id";
pub const GUEST_HEADER: &str = "x-guest-id";
pub const ADMIN_HEADER: &str = "x-admin-token";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve the owner from headers; a user id wins over a guest id.
pub fn owner_from_headers(headers: &HeaderMap) -> Result<Owner, ApiError> {
    if let Some(user) = header(headers, USER_HEADER) {
        if user.len() > 128 {
            return Err(ApiError::BadRequest(format!("{USER_HEADER} is too long")));
        }
        return Ok(Owner::User(user.to_string()));
    }
    match header(headers, GUEST_HEADER) {
        Some(raw) => Uuid::parse_str(raw)
            .map(Owner::Guest)
            .map_err(|_| ApiError::BadRequest(format!("{GUEST_HEADER} must be a UUID"))),
        None => Err(ApiError::BadRequest(format!("missing {GUEST_HEADER} or {USER_HEADER} header"))),
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        owner_from_headers(&parts.headers)
    }
}

/// Compare without short-circuiting on the first differing byte.
fn token_matches(given: &str, expected: &str) -> bool {
    given.len() == expected.len() && given.bytes().zip(expected.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Middleware for the admin router.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let expected = state.admin_token.as_deref().ok_or(ApiError::Forbidden)?;
    let given = header(request.headers(), ADMIN_HEADER).ok_or(ApiError::Forbidden)?;
    if !token_matches(given, expected) {
        tracing::warn!(path = %request.uri().path(), "rejected admin token");
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// `axum::extract::Path` that rejects with [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// `axum::extract::Query` that rejects with [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

/// `Json<T>` that also runs `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_owner_resolution() {
        let mut headers = HeaderMap::new();
        assert!(owner_from_headers(&headers).is_err());

        let guest = Uuid::new_v4();
        headers.insert(GUEST_HEADER, HeaderValue::from_str(&guest.to_string()).unwrap());
        assert_eq!(owner_from_headers(&headers).unwrap(), Owner::Guest(guest));

        headers.insert(USER_HEADER, HeaderValue::from_static("user-7"));
        assert_eq!(owner_from_headers(&headers).unwrap(), Owner::User("user-7".into()));

        headers.remove(USER_HEADER);
        headers.insert(GUEST_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(owner_from_headers(&headers).is_err());
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("abc", "abc"));
        assert!(!token_matches("abd", "abc"));
        assert!(!token_matches("ab", "abc"));
    }
}
