//! Board model types: categories, grants, posts, comments, votes.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Access tier granted on a category. Higher tiers include lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Read = 1,
    Write = 2,
    Manage = 3,
}

impl AccessTier {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(AccessTier::Read),
            2 => Some(AccessTier::Write),
            3 => Some(AccessTier::Manage),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// A board category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i64,
    /// Inactive categories are invisible to everyone.
    pub is_active: bool,
    /// Public categories are readable without a grant.
    pub is_public: bool,
    /// When set, even public reads require a signed-in caller.
    pub require_auth: bool,
    pub created_at: String,
}

/// Who a category grant names: a single user or a whole role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum GrantSubject {
    User(i64),
    Role(i64),
}

/// An explicit access grant on a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGrant {
    pub id: i64,
    pub category_id: i64,
    pub subject: GrantSubject,
    pub tier: AccessTier,
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for CategoryGrant {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let user_id: Option<i64> = row.try_get("user_id")?;
        let role_id: Option<i64> = row.try_get("role_id")?;
        let subject = match (user_id, role_id) {
            (Some(id), None) => GrantSubject::User(id),
            (None, Some(id)) => GrantSubject::Role(id),
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "user_id".to_string(),
                    source: "grant must name exactly one of user or role".into(),
                })
            }
        };
        let tier: i64 = row.try_get("tier")?;
        let tier = AccessTier::from_i64(tier).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "tier".to_string(),
            source: format!("unknown access tier {}", tier).into(),
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            category_id: row.try_get("category_id")?,
            subject,
            tier,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Who wrote a piece of content: a signed-in user, or an anonymous
/// author identified only by a hashed password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// Content owned by a registered user.
    User(i64),
    /// Anonymous content. The string is the Argon2 hash of the author
    /// password chosen at creation time.
    Anonymous(String),
}

impl Author {
    /// User ID when the content is owned, `None` for anonymous content.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Author::User(id) => Some(*id),
            Author::Anonymous(_) => None,
        }
    }
}

fn author_from_row(row: &SqliteRow) -> sqlx::Result<Author> {
    let user_id: Option<i64> = row.try_get("user_id")?;
    let password: Option<String> = row.try_get("author_password")?;
    match (user_id, password) {
        (Some(id), None) => Ok(Author::User(id)),
        (None, Some(hash)) => Ok(Author::Anonymous(hash)),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "user_id".to_string(),
            source: "content must be owned or anonymous, not both".into(),
        }),
    }
}

/// A post in a category.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub category_id: i64,
    pub author: Author,
    pub title: String,
    pub content: String,
    pub author_nickname: String,
    pub view_count: i64,
    pub vote_count: i64,
    pub is_deleted: bool,
    pub is_pinned: bool,
    pub pinned_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Post {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            category_id: row.try_get("category_id")?,
            author: author_from_row(row)?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            author_nickname: row.try_get("author_nickname")?,
            view_count: row.try_get("view_count")?,
            vote_count: row.try_get("vote_count")?,
            is_deleted: row.try_get("is_deleted")?,
            is_pinned: row.try_get("is_pinned")?,
            pinned_at: row.try_get("pinned_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A comment on a post, optionally replying to another comment.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub author: Author,
    pub content: String,
    pub author_nickname: String,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Comment {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            parent_comment_id: row.try_get("parent_comment_id")?,
            author: author_from_row(row)?,
            content: row.try_get("content")?,
            author_nickname: row.try_get("author_nickname")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Who is casting a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Voter {
    /// A signed-in user. At most one vote per post, enforced by the
    /// storage layer.
    User(i64),
    /// An anonymous voter identified by client address. At most one
    /// vote per post, enforced by the vote transaction.
    Anonymous(String),
}

/// How far administrator privilege reaches into content mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminOverride {
    /// Administrators may edit and delete any content.
    #[default]
    Full,
    /// Administrators are bound by the same ownership rules as
    /// everyone else.
    OwnedOnly,
}

/// Data for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i64,
    pub is_public: bool,
    pub require_auth: bool,
}

/// Data for creating a post. The author password, when present, must
/// already be hashed.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub category_id: i64,
    pub author: Author,
    pub title: String,
    pub content: String,
    pub author_nickname: String,
}

/// Data for creating a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub author: Author,
    pub content: String,
    pub author_nickname: String,
}
