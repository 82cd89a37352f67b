//! Board domain: categories, access control, posts, comments, votes.

pub mod access;
pub mod category_repository;
pub mod comment_repository;
pub mod post_repository;
pub mod service;
pub mod types;

pub use access::{evaluate_access, AccessService, Caller, CategoryAccess};
pub use category_repository::CategoryRepository;
pub use comment_repository::CommentRepository;
pub use post_repository::PostRepository;
pub use service::{authorize_mutation, BoardService};
pub use types::{
    AccessTier, AdminOverride, Author, Category, CategoryGrant, Comment, GrantSubject,
    NewCategory, NewComment, NewPost, Post, Voter,
};
