//! Authentication handlers: register, login, logout, me.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use super::{client_ip, AppState};
use crate::auth::LoginDenied;
use crate::web::dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserResponse};
use crate::web::error::ApiError;
use crate::web::middleware::{removal_cookie, session_cookie, AuthSession};

/// POST /api/auth/register
///
/// Creates an account with the default role. Does not log the new
/// user in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let user = state
        .auth
        .register(
            &request.username,
            &request.email,
            &request.password,
            &request.display_name,
        )
        .await?
        .ok_or_else(|| ApiError::conflict("Username or email is already taken"))?;

    let roles = state.roles.roles_of(user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_user(&user, roles)),
    ))
}

/// POST /api/auth/login
///
/// On success the session token is set as a cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let ip = client_ip(&headers);
    let outcome = state.auth.login(&request.username, &request.password, &ip).await?;

    let success = outcome.map_err(|denied| match &denied {
        LoginDenied::Locked { .. } | LoginDenied::LockedNow { .. } => {
            ApiError::locked(denied.message())
        }
        LoginDenied::InvalidCredentials { .. } => ApiError::unauthorized(denied.message()),
    })?;

    let cookie = session_cookie(&success.token, state.auth.keys().lifetime_secs());
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: UserResponse::from_user(&success.user, success.roles),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Clears the session cookie. The token itself simply expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(removal_cookie()),
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /api/auth/me
///
/// The current user, read fresh from the database.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthSession(claims): AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::unauthorized("Account no longer available"))?;

    let roles = state.roles.roles_of(user.id).await?;
    Ok(Json(UserResponse::from_user(&user, roles)))
}
