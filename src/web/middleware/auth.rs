//! Session authentication middleware.
//!
//! Sessions arrive as a signed token in the session cookie or an
//! Authorization bearer header. The middleware injects the shared
//! [`SessionKeys`] into request extensions and reissues the cookie
//! when the token is past half its lifetime.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use std::sync::Arc;

use crate::auth::session::{SessionClaims, SessionKeys, SESSION_COOKIE};
use crate::web::error::ApiError;

/// Pull the session token from the bearer header or the cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    let raw = headers.get(COOKIE)?.to_str().ok()?;
    Cookie::split_parse(raw.to_string())
        .filter_map(|c| c.ok())
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Build the session cookie for a token.
pub fn session_cookie(token: &str, lifetime_secs: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(lifetime_secs as i64))
        .build()
}

/// Build a cookie that clears the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}

/// Extractor for authenticated requests.
///
/// Rejects the request when no valid session is present.
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionClaims);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = extract_token(&parts.headers)
                .ok_or_else(|| ApiError::unauthorized("Missing session"))?;

            let keys = parts
                .extensions
                .get::<Arc<SessionKeys>>()
                .ok_or_else(|| ApiError::internal("Session keys not configured"))?;

            let claims = keys.verify(&token).map_err(|e| {
                tracing::debug!("session verification failed: {}", e);
                ApiError::unauthorized("Invalid or expired session")
            })?;

            Ok(AuthSession(claims))
        })
    }
}

/// Optional session extractor.
///
/// Yields `None` instead of failing when no valid session is present.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = match extract_token(&parts.headers) {
                Some(token) => token,
                None => return Ok(OptionalSession(None)),
            };

            let keys = match parts.extensions.get::<Arc<SessionKeys>>() {
                Some(keys) => keys,
                None => return Ok(OptionalSession(None)),
            };

            match keys.verify(&token) {
                Ok(claims) => Ok(OptionalSession(Some(claims))),
                Err(_) => Ok(OptionalSession(None)),
            }
        })
    }
}

/// Middleware injecting session keys and sliding the session window.
///
/// A valid token older than half its lifetime is reissued via a
/// Set-Cookie header on the response.
pub async fn session_auth(
    keys: Arc<SessionKeys>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(keys.clone());

    let stale_claims = extract_token(request.headers())
        .and_then(|token| keys.verify(&token).ok())
        .filter(|claims| keys.needs_refresh(claims));

    let mut response = next.run(request).await;

    if let Some(claims) = stale_claims {
        if let Ok(token) = keys.refresh(&claims) {
            let cookie = session_cookie(&token, keys.lifetime_secs());
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
    }

    response
}
