//! Comment persistence.

use sqlx::SqlitePool;

use super::types::{Author, Comment, NewComment};
use crate::{BoardError, Result};

/// Repository for comments.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment.
    pub async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let (user_id, author_password) = match &new_comment.author {
            Author::User(id) => (Some(*id), None),
            Author::Anonymous(hash) => (None, Some(hash.as_str())),
        };

        let result = sqlx::query(
            "INSERT INTO comments (post_id, parent_comment_id, user_id, content, author_nickname, author_password)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_comment.post_id)
        .bind(new_comment.parent_comment_id)
        .bind(user_id)
        .bind(&new_comment.content)
        .bind(&new_comment.author_nickname)
        .bind(author_password)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| BoardError::Database("created comment not found".to_string()))
    }

    /// Find a comment by ID, including soft-deleted comments.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Comments on a post in creation order, excluding soft-deleted
    /// ones. Reply threading is left to the caller via
    /// `parent_comment_id`.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments
             WHERE post_id = ? AND is_deleted = 0
             ORDER BY created_at, id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Update a comment's content.
    pub async fn update(&self, id: i64, content: &str) -> Result<Option<Comment>> {
        sqlx::query(
            "UPDATE comments SET content = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(id).await
    }

    /// Soft-delete a comment.
    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE comments SET is_deleted = 1, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
