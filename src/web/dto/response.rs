//! Response DTOs for the web API.

use serde::Serialize;

use crate::board::access::CategoryAccess;
use crate::board::types::{Category, CategoryGrant, Comment, GrantSubject, Post};
use crate::db::user::User;

/// A user as exposed by the API. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            roles,
            created_at: user.created_at.clone(),
        }
    }
}

/// Login response. The session itself travels in the cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
}

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A category with the caller's access flags.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i64,
    pub is_public: bool,
    pub require_auth: bool,
    pub access: CategoryAccess,
}

impl CategoryResponse {
    pub fn from_category(category: &Category, access: CategoryAccess) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            display_order: category.display_order,
            is_public: category.is_public,
            require_auth: category.require_auth,
            access,
        }
    }
}

/// A post as exposed by the API. Anonymous author hashes never leave
/// the server.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub category_id: i64,
    pub user_id: Option<i64>,
    pub is_anonymous: bool,
    pub title: String,
    pub content: String,
    pub author_nickname: String,
    pub view_count: i64,
    pub vote_count: i64,
    pub is_pinned: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl PostResponse {
    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            category_id: post.category_id,
            user_id: post.author.user_id(),
            is_anonymous: post.author.user_id().is_none(),
            title: post.title.clone(),
            content: post.content.clone(),
            author_nickname: post.author_nickname.clone(),
            view_count: post.view_count,
            vote_count: post.vote_count,
            is_pinned: post.is_pinned,
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
        }
    }
}

/// A comment as exposed by the API.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub user_id: Option<i64>,
    pub is_anonymous: bool,
    pub content: String,
    pub author_nickname: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl CommentResponse {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_comment_id: comment.parent_comment_id,
            user_id: comment.author.user_id(),
            is_anonymous: comment.author.user_id().is_none(),
            content: comment.content.clone(),
            author_nickname: comment.author_nickname.clone(),
            created_at: comment.created_at.clone(),
            updated_at: comment.updated_at.clone(),
        }
    }
}

/// Result of a vote request.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// Whether this request recorded a new vote.
    pub voted: bool,
    /// The post's vote count after the request.
    pub vote_count: i64,
}

/// An access grant as exposed by the API.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub id: i64,
    pub category_id: i64,
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
    pub tier: String,
}

impl GrantResponse {
    pub fn from_grant(grant: &CategoryGrant) -> Self {
        let (user_id, role_id) = match grant.subject {
            GrantSubject::User(id) => (Some(id), None),
            GrantSubject::Role(id) => (None, Some(id)),
        };
        Self {
            id: grant.id,
            category_id: grant.category_id,
            user_id,
            role_id,
            tier: format!("{:?}", grant.tier).to_lowercase(),
        }
    }
}
