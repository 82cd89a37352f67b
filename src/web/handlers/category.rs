//! Category handlers: listing, posts by category, access grants.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::board::types::{AccessTier, GrantSubject};
use crate::web::dto::{
    CategoryResponse, GrantAccessRequest, GrantResponse, ListPostsQuery, MessageResponse,
    PostResponse, RevokeAccessRequest,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthSession, OptionalSession};

/// GET /api/categories
///
/// Active categories the caller can read, with access flags.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let caller = state.caller(session.as_ref()).await?;
    let categories = state.board.access().accessible_categories(&caller).await?;
    Ok(Json(
        categories
            .iter()
            .map(|(category, access)| CategoryResponse::from_category(category, *access))
            .collect(),
    ))
}

/// GET /api/categories/{slug}/posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<ListPostsQuery>,
    OptionalSession(session): OptionalSession,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let caller = state.caller(session.as_ref()).await?;
    let posts = state
        .board
        .list_posts(
            &caller,
            category.id,
            query.search.as_deref(),
            query.limit,
            query.offset,
        )
        .await?;
    Ok(Json(posts.iter().map(PostResponse::from_post).collect()))
}

fn parse_subject(user_id: Option<i64>, role_id: Option<i64>) -> Result<GrantSubject, ApiError> {
    match (user_id, role_id) {
        (Some(id), None) => Ok(GrantSubject::User(id)),
        (None, Some(id)) => Ok(GrantSubject::Role(id)),
        _ => Err(ApiError::bad_request(
            "Exactly one of user_id and role_id is required",
        )),
    }
}

fn parse_tier(tier: &str) -> Result<AccessTier, ApiError> {
    match tier {
        "read" => Ok(AccessTier::Read),
        "write" => Ok(AccessTier::Write),
        "manage" => Ok(AccessTier::Manage),
        other => Err(ApiError::bad_request(format!(
            "Unknown access tier '{}'",
            other
        ))),
    }
}

async fn require_manage(
    state: &AppState,
    category_id: i64,
    claims: &crate::auth::SessionClaims,
) -> Result<(), ApiError> {
    let caller = state.caller(Some(claims)).await?;
    let access = state
        .board
        .access()
        .access_for_id(category_id, &caller)
        .await?;
    if access.can_manage {
        Ok(())
    } else {
        Err(ApiError::forbidden("Manage access required"))
    }
}

/// GET /api/categories/{id}/access
///
/// All grants on a category. Requires manage access.
pub async fn list_grants(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
    AuthSession(claims): AuthSession,
) -> Result<Json<Vec<GrantResponse>>, ApiError> {
    require_manage(&state, category_id, &claims).await?;
    let grants = state.categories.grants_for_category(category_id).await?;
    Ok(Json(grants.iter().map(GrantResponse::from_grant).collect()))
}

/// POST /api/categories/{id}/access
///
/// Grants a tier to a user or role. Requires manage access on the
/// category. Granting again replaces the subject's tier.
pub async fn grant_access(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
    AuthSession(claims): AuthSession,
    Json(request): Json<GrantAccessRequest>,
) -> Result<(StatusCode, Json<GrantResponse>), ApiError> {
    require_manage(&state, category_id, &claims).await?;

    let subject = parse_subject(request.user_id, request.role_id)?;
    let tier = parse_tier(&request.tier)?;

    let grant = state
        .board
        .access()
        .grant(category_id, subject, tier)
        .await?;
    Ok((StatusCode::CREATED, Json(GrantResponse::from_grant(&grant))))
}

/// DELETE /api/categories/{id}/access
pub async fn revoke_access(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
    AuthSession(claims): AuthSession,
    Json(request): Json<RevokeAccessRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_manage(&state, category_id, &claims).await?;

    let subject = parse_subject(request.user_id, request.role_id)?;
    let removed = state.board.access().revoke(category_id, subject).await?;
    if removed {
        Ok(Json(MessageResponse::new("Access revoked")))
    } else {
        Err(ApiError::not_found("No such grant"))
    }
}
