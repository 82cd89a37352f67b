//! Board content service.
//!
//! Routes every read through category access checks and every
//! mutation through the ownership rules: under the default policy
//! administrators edit anything; otherwise owned content is edited by
//! its owner and anonymous content by whoever proves the author
//! password.

use tracing::info;

use super::access::{AccessService, Caller};
use super::comment_repository::CommentRepository;
use super::post_repository::PostRepository;
use super::types::{
    AdminOverride, Author, Comment, NewComment, NewPost, Post, Voter,
};
use crate::auth::password::{hash_password, verify_password};
use crate::{BoardError, Result};

/// Check whether a caller may mutate a piece of content.
///
/// An administrator passes outright when the policy allows the
/// override, anonymous content included. Otherwise owned content
/// requires the caller to be the owner and anonymous content requires
/// the author password chosen at creation time.
pub fn authorize_mutation(
    author: &Author,
    caller: &Caller,
    password: Option<&str>,
    policy: AdminOverride,
) -> Result<()> {
    if policy == AdminOverride::Full && caller.is_admin {
        return Ok(());
    }
    match author {
        Author::User(owner_id) => {
            if caller.user_id == Some(*owner_id) {
                return Ok(());
            }
            Err(BoardError::Permission(
                "only the author can modify this content".to_string(),
            ))
        }
        Author::Anonymous(hash) => {
            let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                BoardError::Auth("author password required".to_string())
            })?;
            let verified = verify_password(password, hash)
                .map_err(|e| BoardError::Auth(e.to_string()))?;
            if verified {
                Ok(())
            } else {
                Err(BoardError::Auth("wrong author password".to_string()))
            }
        }
    }
}

/// Resolve the author of new content from the caller, hashing the
/// author password for anonymous callers.
fn resolve_author(caller: &Caller, password: Option<&str>) -> Result<Author> {
    match caller.user_id {
        Some(id) => Ok(Author::User(id)),
        None => {
            let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                BoardError::Validation(
                    "anonymous content requires an author password".to_string(),
                )
            })?;
            let hash =
                hash_password(password).map_err(|e| BoardError::Auth(e.to_string()))?;
            Ok(Author::Anonymous(hash))
        }
    }
}

/// Service for posts, comments, and votes.
#[derive(Clone)]
pub struct BoardService {
    access: AccessService,
    posts: PostRepository,
    comments: CommentRepository,
    admin_override: AdminOverride,
}

impl BoardService {
    pub fn new(
        access: AccessService,
        posts: PostRepository,
        comments: CommentRepository,
    ) -> Self {
        Self {
            access,
            posts,
            comments,
            admin_override: AdminOverride::default(),
        }
    }

    /// Override the administrator mutation policy.
    pub fn with_admin_override(mut self, policy: AdminOverride) -> Self {
        self.admin_override = policy;
        self
    }

    /// The access service, shared with the web layer.
    pub fn access(&self) -> &AccessService {
        &self.access
    }

    async fn require_read(&self, category_id: i64, caller: &Caller) -> Result<()> {
        let access = self.access.access_for_id(category_id, caller).await?;
        if access.can_read {
            Ok(())
        } else {
            Err(BoardError::Permission(
                "no read access to this category".to_string(),
            ))
        }
    }

    async fn require_write(&self, category_id: i64, caller: &Caller) -> Result<()> {
        let access = self.access.access_for_id(category_id, caller).await?;
        if access.can_write {
            Ok(())
        } else {
            Err(BoardError::Permission(
                "no write access to this category".to_string(),
            ))
        }
    }

    /// A post that exists and is not soft-deleted.
    async fn live_post(&self, post_id: i64) -> Result<Post> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| BoardError::NotFound("post".to_string()))?;
        Ok(post)
    }

    /// Create a post in a category.
    pub async fn create_post(
        &self,
        caller: &Caller,
        category_id: i64,
        title: &str,
        content: &str,
        nickname: &str,
        author_password: Option<&str>,
    ) -> Result<Post> {
        if title.trim().is_empty() {
            return Err(BoardError::Validation("title is required".to_string()));
        }
        if content.trim().is_empty() {
            return Err(BoardError::Validation("content is required".to_string()));
        }
        if nickname.trim().is_empty() {
            return Err(BoardError::Validation("nickname is required".to_string()));
        }

        self.require_write(category_id, caller).await?;
        let author = resolve_author(caller, author_password)?;

        let post = self
            .posts
            .create(&NewPost {
                category_id,
                author,
                title: title.to_string(),
                content: content.to_string(),
                author_nickname: nickname.to_string(),
            })
            .await?;
        info!("post {} created in category {}", post.id, category_id);
        Ok(post)
    }

    /// Fetch a post, counting the view.
    pub async fn get_post(&self, caller: &Caller, post_id: i64) -> Result<Post> {
        let post = self.live_post(post_id).await?;
        self.require_read(post.category_id, caller).await?;
        self.posts.increment_view(post.id).await?;
        self.posts
            .find_by_id(post.id)
            .await?
            .ok_or_else(|| BoardError::NotFound("post".to_string()))
    }

    /// List posts in a category, optionally filtered by a search term.
    pub async fn list_posts(
        &self,
        caller: &Caller,
        category_id: i64,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        self.require_read(category_id, caller).await?;
        self.posts
            .list_by_category(category_id, search, limit.clamp(1, 100), offset.max(0))
            .await
    }

    /// Pin or unpin a post. Requires manage access on its category.
    pub async fn set_post_pinned(
        &self,
        caller: &Caller,
        post_id: i64,
        pinned: bool,
    ) -> Result<Post> {
        let post = self.live_post(post_id).await?;
        let access = self.access.access_for_id(post.category_id, caller).await?;
        if !access.can_manage {
            return Err(BoardError::Permission(
                "manage access required to pin posts".to_string(),
            ));
        }
        self.posts.set_pinned(post.id, pinned).await?;
        self.live_post(post.id).await
    }

    /// Update a post's title and content.
    pub async fn update_post(
        &self,
        caller: &Caller,
        post_id: i64,
        title: &str,
        content: &str,
        author_password: Option<&str>,
    ) -> Result<Post> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(BoardError::Validation(
                "title and content are required".to_string(),
            ));
        }

        let post = self.live_post(post_id).await?;
        authorize_mutation(&post.author, caller, author_password, self.admin_override)?;

        self.posts
            .update(post.id, title, content)
            .await?
            .ok_or_else(|| BoardError::NotFound("post".to_string()))
    }

    /// Soft-delete a post.
    pub async fn delete_post(
        &self,
        caller: &Caller,
        post_id: i64,
        author_password: Option<&str>,
    ) -> Result<()> {
        let post = self.live_post(post_id).await?;
        authorize_mutation(&post.author, caller, author_password, self.admin_override)?;
        self.posts.soft_delete(post.id).await?;
        info!("post {} deleted", post.id);
        Ok(())
    }

    /// Vote on a post. Each user and each anonymous address may vote
    /// once per post. Returns the post's new vote count, or `None`
    /// when the vote was a duplicate.
    pub async fn vote_post(
        &self,
        caller: &Caller,
        post_id: i64,
        client_ip: &str,
    ) -> Result<Option<i64>> {
        let post = self.live_post(post_id).await?;
        self.require_read(post.category_id, caller).await?;

        let voter = match caller.user_id {
            Some(id) => Voter::User(id),
            None => Voter::Anonymous(client_ip.to_string()),
        };

        if !self.posts.record_vote(post.id, &voter).await? {
            return Ok(None);
        }
        let post = self.live_post(post.id).await?;
        Ok(Some(post.vote_count))
    }

    /// List comments on a post.
    pub async fn list_comments(&self, caller: &Caller, post_id: i64) -> Result<Vec<Comment>> {
        let post = self.live_post(post_id).await?;
        self.require_read(post.category_id, caller).await?;
        self.comments.list_by_post(post.id).await
    }

    /// Create a comment on a post, optionally replying to another
    /// comment on the same post.
    pub async fn create_comment(
        &self,
        caller: &Caller,
        post_id: i64,
        parent_comment_id: Option<i64>,
        content: &str,
        nickname: &str,
        author_password: Option<&str>,
    ) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(BoardError::Validation("content is required".to_string()));
        }
        if nickname.trim().is_empty() {
            return Err(BoardError::Validation("nickname is required".to_string()));
        }

        let post = self.live_post(post_id).await?;
        self.require_write(post.category_id, caller).await?;

        if let Some(parent_id) = parent_comment_id {
            self.comments
                .find_by_id(parent_id)
                .await?
                .filter(|c| !c.is_deleted && c.post_id == post.id)
                .ok_or_else(|| BoardError::NotFound("parent comment".to_string()))?;
        }

        let author = resolve_author(caller, author_password)?;
        self.comments
            .create(&NewComment {
                post_id: post.id,
                parent_comment_id,
                author,
                content: content.to_string(),
                author_nickname: nickname.to_string(),
            })
            .await
    }

    /// Update a comment's content.
    pub async fn update_comment(
        &self,
        caller: &Caller,
        comment_id: i64,
        content: &str,
        author_password: Option<&str>,
    ) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(BoardError::Validation("content is required".to_string()));
        }

        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| BoardError::NotFound("comment".to_string()))?;
        authorize_mutation(&comment.author, caller, author_password, self.admin_override)?;

        self.comments
            .update(comment.id, content)
            .await?
            .ok_or_else(|| BoardError::NotFound("comment".to_string()))
    }

    /// Soft-delete a comment.
    pub async fn delete_comment(
        &self,
        caller: &Caller,
        comment_id: i64,
        author_password: Option<&str>,
    ) -> Result<()> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| BoardError::NotFound("comment".to_string()))?;
        authorize_mutation(&comment.author, caller, author_password, self.admin_override)?;
        self.comments.soft_delete(comment.id).await?;
        Ok(())
    }
}
