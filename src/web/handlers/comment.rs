//! Comment handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::post::resolve_nickname;
use super::AppState;
use crate::web::dto::{
    CommentResponse, CreateCommentRequest, DeleteContentRequest, MessageResponse,
    UpdateCommentRequest,
};
use crate::web::error::ApiError;
use crate::web::middleware::OptionalSession;

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let comments = state.board.list_comments(&caller, post_id).await?;
    Ok(Json(
        comments.iter().map(CommentResponse::from_comment).collect(),
    ))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    OptionalSession(session): OptionalSession,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let caller = state.caller(session.as_ref()).await?;
    let nickname = resolve_nickname(request.nickname.as_deref(), session.as_ref())?;

    let comment = state
        .board
        .create_comment(
            &caller,
            request.post_id,
            request.parent_comment_id,
            &request.content,
            &nickname,
            request.author_password.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::from_comment(&comment)),
    ))
}

/// PUT /api/comments/{id}
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
    OptionalSession(session): OptionalSession,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let caller = state.caller(session.as_ref()).await?;
    let comment = state
        .board
        .update_comment(
            &caller,
            comment_id,
            &request.content,
            request.author_password.as_deref(),
        )
        .await?;
    Ok(Json(CommentResponse::from_comment(&comment)))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
    OptionalSession(session): OptionalSession,
    body: Option<Json<DeleteContentRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let password = body.as_ref().and_then(|b| b.author_password.clone());
    state
        .board
        .delete_comment(&caller, comment_id, password.as_deref())
        .await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}
