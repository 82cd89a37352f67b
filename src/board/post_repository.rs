//! Post persistence and vote recording.

use sqlx::SqlitePool;

use super::types::{Author, NewPost, Post, Voter};
use crate::{BoardError, Result};

/// Repository for posts and post votes.
#[derive(Debug, Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a post.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let (user_id, author_password) = match &new_post.author {
            Author::User(id) => (Some(*id), None),
            Author::Anonymous(hash) => (None, Some(hash.as_str())),
        };

        let result = sqlx::query(
            "INSERT INTO posts (category_id, user_id, title, content, author_nickname, author_password)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_post.category_id)
        .bind(user_id)
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(&new_post.author_nickname)
        .bind(author_password)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| BoardError::Database("created post not found".to_string()))
    }

    /// Find a post by ID, including soft-deleted posts.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Posts in a category, pinned first, newest first, excluding
    /// soft-deleted posts. An optional search term matches title or
    /// content.
    pub async fn list_by_category(
        &self,
        category_id: i64,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts
                     WHERE category_id = ? AND is_deleted = 0
                       AND (title LIKE ? OR content LIKE ?)
                     ORDER BY is_pinned DESC, created_at DESC, id DESC
                     LIMIT ? OFFSET ?",
                )
                .bind(category_id)
                .bind(&pattern)
                .bind(&pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts
                     WHERE category_id = ? AND is_deleted = 0
                     ORDER BY is_pinned DESC, created_at DESC, id DESC
                     LIMIT ? OFFSET ?",
                )
                .bind(category_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Update a post's title and content.
    pub async fn update(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>> {
        sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(id).await
    }

    /// Soft-delete a post.
    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET is_deleted = 1, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Pin or unpin a post.
    pub async fn set_pinned(&self, id: i64, pinned: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts
             SET is_pinned = ?,
                 pinned_at = CASE WHEN ? THEN datetime('now') ELSE NULL END
             WHERE id = ?",
        )
        .bind(pinned)
        .bind(pinned)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump the view counter.
    pub async fn increment_view(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a vote on a post.
    ///
    /// The duplicate check, the insert, and the counter bump run in
    /// one transaction so concurrent votes cannot double-count.
    /// Returns false when the voter already voted on this post.
    pub async fn record_vote(&self, post_id: i64, voter: &Voter) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;

        let existing: Option<(i64,)> = match voter {
            Voter::User(user_id) => {
                sqlx::query_as("SELECT 1 FROM post_votes WHERE post_id = ? AND user_id = ?")
                    .bind(post_id)
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await
            }
            Voter::Anonymous(ip) => {
                sqlx::query_as("SELECT 1 FROM post_votes WHERE post_id = ? AND ip_address = ?")
                    .bind(post_id)
                    .bind(ip)
                    .fetch_optional(&mut *tx)
                    .await
            }
        }
        .map_err(|e| BoardError::Database(e.to_string()))?;

        if existing.is_some() {
            tx.rollback()
                .await
                .map_err(|e| BoardError::Database(e.to_string()))?;
            return Ok(false);
        }

        match voter {
            Voter::User(user_id) => {
                sqlx::query("INSERT INTO post_votes (post_id, user_id) VALUES (?, ?)")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
            }
            Voter::Anonymous(ip) => {
                sqlx::query("INSERT INTO post_votes (post_id, ip_address) VALUES (?, ?)")
                    .bind(post_id)
                    .bind(ip)
                    .execute(&mut *tx)
                    .await
            }
        }
        .map_err(|e| BoardError::Database(e.to_string()))?;

        sqlx::query("UPDATE posts SET vote_count = vote_count + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> (Database, PostRepository, i64) {
        let db = Database::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO categories (name, slug) VALUES ('General', 'general')")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password, display_name)
             VALUES ('alice', 'alice@example.com', 'x', 'Alice')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        let repo = PostRepository::new(db.pool().clone());
        (db, repo, 1)
    }

    fn owned_post(category_id: i64, title: &str) -> NewPost {
        NewPost {
            category_id,
            author: Author::User(1),
            title: title.to_string(),
            content: "body".to_string(),
            author_nickname: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_owned_post() {
        let (_db, repo, category_id) = setup().await;
        let post = repo.create(&owned_post(category_id, "Hello")).await.unwrap();
        assert_eq!(post.author, Author::User(1));
        assert_eq!(post.vote_count, 0);
        assert!(!post.is_deleted);
    }

    #[tokio::test]
    async fn test_create_anonymous_post() {
        let (_db, repo, category_id) = setup().await;
        let post = repo
            .create(&NewPost {
                category_id,
                author: Author::Anonymous("$argon2id$hash".to_string()),
                title: "Anon".to_string(),
                content: "body".to_string(),
                author_nickname: "Guest".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(post.author, Author::Anonymous("$argon2id$hash".to_string()));
    }

    #[tokio::test]
    async fn test_list_excludes_deleted() {
        let (_db, repo, category_id) = setup().await;
        let a = repo.create(&owned_post(category_id, "A")).await.unwrap();
        repo.create(&owned_post(category_id, "B")).await.unwrap();
        repo.soft_delete(a.id).await.unwrap();

        let posts = repo
            .list_by_category(category_id, None, 50, 0)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "B");

        // The deleted post is still reachable by ID
        let deleted = repo.find_by_id(a.id).await.unwrap().unwrap();
        assert!(deleted.is_deleted);
    }

    #[tokio::test]
    async fn test_pinned_posts_list_first() {
        let (_db, repo, category_id) = setup().await;
        let a = repo.create(&owned_post(category_id, "A")).await.unwrap();
        repo.create(&owned_post(category_id, "B")).await.unwrap();

        assert!(repo.set_pinned(a.id, true).await.unwrap());
        let posts = repo
            .list_by_category(category_id, None, 50, 0)
            .await
            .unwrap();
        assert_eq!(posts[0].title, "A");
        assert!(posts[0].is_pinned);
        assert!(posts[0].pinned_at.is_some());

        assert!(repo.set_pinned(a.id, false).await.unwrap());
        let post = repo.find_by_id(a.id).await.unwrap().unwrap();
        assert!(!post.is_pinned);
        assert!(post.pinned_at.is_none());
    }

    #[tokio::test]
    async fn test_search_matches_title_and_content() {
        let (_db, repo, category_id) = setup().await;
        repo.create(&owned_post(category_id, "Meeting notes"))
            .await
            .unwrap();
        repo.create(&NewPost {
            category_id,
            author: Author::User(1),
            title: "Other".to_string(),
            content: "notes from the meeting".to_string(),
            author_nickname: "Alice".to_string(),
        })
        .await
        .unwrap();
        repo.create(&owned_post(category_id, "Unrelated")).await.unwrap();

        let posts = repo
            .list_by_category(category_id, Some("meeting"), 50, 0)
            .await
            .unwrap();
        assert_eq!(posts.len(), 2);

        let posts = repo
            .list_by_category(category_id, Some("   "), 50, 0)
            .await
            .unwrap();
        assert_eq!(posts.len(), 3);
    }

    #[tokio::test]
    async fn test_update() {
        let (_db, repo, category_id) = setup().await;
        let post = repo.create(&owned_post(category_id, "Old")).await.unwrap();
        let updated = repo
            .update(post.id, "New", "new body")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_view_counter() {
        let (_db, repo, category_id) = setup().await;
        let post = repo.create(&owned_post(category_id, "Hi")).await.unwrap();
        repo.increment_view(post.id).await.unwrap();
        repo.increment_view(post.id).await.unwrap();
        let post = repo.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.view_count, 2);
    }

    #[tokio::test]
    async fn test_vote_once_per_user() {
        let (_db, repo, category_id) = setup().await;
        let post = repo.create(&owned_post(category_id, "Hi")).await.unwrap();

        assert!(repo.record_vote(post.id, &Voter::User(1)).await.unwrap());
        assert!(!repo.record_vote(post.id, &Voter::User(1)).await.unwrap());

        let post = repo.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.vote_count, 1);
    }

    #[tokio::test]
    async fn test_vote_once_per_address() {
        let (_db, repo, category_id) = setup().await;
        let post = repo.create(&owned_post(category_id, "Hi")).await.unwrap();

        let voter = Voter::Anonymous("10.0.0.1".to_string());
        assert!(repo.record_vote(post.id, &voter).await.unwrap());
        assert!(!repo.record_vote(post.id, &voter).await.unwrap());

        let other = Voter::Anonymous("10.0.0.2".to_string());
        assert!(repo.record_vote(post.id, &other).await.unwrap());

        let post = repo.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.vote_count, 2);
    }

    #[tokio::test]
    async fn test_votes_are_per_post() {
        let (_db, repo, category_id) = setup().await;
        let a = repo.create(&owned_post(category_id, "A")).await.unwrap();
        let b = repo.create(&owned_post(category_id, "B")).await.unwrap();

        assert!(repo.record_vote(a.id, &Voter::User(1)).await.unwrap());
        assert!(repo.record_vote(b.id, &Voter::User(1)).await.unwrap());
    }
}
