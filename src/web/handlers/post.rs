//! Post handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use super::{client_ip, AppState};
use crate::auth::session::SessionClaims;
use crate::web::dto::{
    CreatePostRequest, DeleteContentRequest, MessageResponse, PostResponse, UpdatePostRequest,
    VoteResponse,
};
use crate::web::error::ApiError;
use crate::web::middleware::OptionalSession;

/// The nickname shown on new content: the explicit one when given,
/// otherwise the signed-in caller's display name.
pub(super) fn resolve_nickname(
    nickname: Option<&str>,
    session: Option<&SessionClaims>,
) -> Result<String, ApiError> {
    if let Some(nickname) = nickname.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(nickname.to_string());
    }
    session
        .map(|claims| claims.display_name.clone())
        .ok_or_else(|| ApiError::bad_request("A nickname is required for anonymous content"))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    OptionalSession(session): OptionalSession,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let caller = state.caller(session.as_ref()).await?;
    let nickname = resolve_nickname(request.nickname.as_deref(), session.as_ref())?;

    let post = state
        .board
        .create_post(
            &caller,
            request.category_id,
            &request.title,
            &request.content,
            &nickname,
            request.author_password.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from_post(&post))))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<PostResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let post = state.board.get_post(&caller, post_id).await?;
    Ok(Json(PostResponse::from_post(&post)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let caller = state.caller(session.as_ref()).await?;
    let post = state
        .board
        .update_post(
            &caller,
            post_id,
            &request.title,
            &request.content,
            request.author_password.as_deref(),
        )
        .await?;
    Ok(Json(PostResponse::from_post(&post)))
}

/// DELETE /api/posts/{id}
///
/// The body is optional; anonymous posts require the author password
/// in it.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
    body: Option<Json<DeleteContentRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let password = body.as_ref().and_then(|b| b.author_password.clone());
    state
        .board
        .delete_post(&caller, post_id, password.as_deref())
        .await?;
    Ok(Json(MessageResponse::new("Post deleted")))
}

/// POST /api/posts/{id}/pin
///
/// Requires manage access on the post's category.
pub async fn pin_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<PostResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let post = state.board.set_post_pinned(&caller, post_id, true).await?;
    Ok(Json(PostResponse::from_post(&post)))
}

/// DELETE /api/posts/{id}/pin
pub async fn unpin_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<PostResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let post = state.board.set_post_pinned(&caller, post_id, false).await?;
    Ok(Json(PostResponse::from_post(&post)))
}

/// POST /api/posts/{id}/vote
///
/// One vote per user, or per client address for anonymous callers.
/// Voting twice is not an error; `voted` reports whether this request
/// counted.
pub async fn vote_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    OptionalSession(session): OptionalSession,
) -> Result<Json<VoteResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let ip = client_ip(&headers);

    match state.board.vote_post(&caller, post_id, &ip).await? {
        Some(vote_count) => Ok(Json(VoteResponse {
            voted: true,
            vote_count,
        })),
        None => {
            let post = state.board.get_post(&caller, post_id).await?;
            Ok(Json(VoteResponse {
                voted: false,
                vote_count: post.vote_count,
            }))
        }
    }
}
