//! Request DTOs for the web API.

use serde::Deserialize;
use validator::Validate;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username (3-30 characters).
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password. The strength policy is enforced by the auth service.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: String,
}

/// Post creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Target category ID.
    pub category_id: i64,
    /// Post title.
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    /// Post body.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    /// Nickname shown as the author. Optional for signed-in callers,
    /// whose display name is used when absent.
    pub nickname: Option<String>,
    /// Author password, required for anonymous posts.
    pub author_password: Option<String>,
}

/// Post update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    /// Author password, required for anonymous posts.
    pub author_password: Option<String>,
}

/// Body for deleting content; carries the author password for
/// anonymous content.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteContentRequest {
    pub author_password: Option<String>,
}

/// Comment creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Target post ID.
    pub post_id: i64,
    /// Parent comment for replies.
    pub parent_comment_id: Option<i64>,
    /// Comment body.
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
    /// Nickname shown as the author.
    pub nickname: Option<String>,
    /// Author password, required for anonymous comments.
    pub author_password: Option<String>,
}

/// Comment update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
    pub author_password: Option<String>,
}

/// Access grant request. Exactly one of `user_id` / `role_id` must be
/// set.
#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
    /// Access tier: "read", "write", or "manage".
    pub tier: String,
}

/// Access revocation request. Exactly one of `user_id` / `role_id`
/// must be set.
#[derive(Debug, Deserialize)]
pub struct RevokeAccessRequest {
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
}

/// Pagination and search query for post listings.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Optional search term matched against title and content.
    pub search: Option<String>,
}

fn default_limit() -> i64 {
    50
}
