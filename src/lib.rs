//! Corkboard - community bulletin board.
//!
//! A forum backend with per-category access control, anonymous
//! posting protected by author passwords, and rate-limited login.

pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, validate_password, verify_password, AuthService, LoginDenied, LoginSuccess,
    PasswordError, RoleService, SessionClaims, SessionKeys, SESSION_COOKIE,
};
pub use board::{
    authorize_mutation, evaluate_access, AccessService, AccessTier, AdminOverride, Author,
    BoardService, Caller, Category, CategoryAccess, CategoryGrant, Comment, GrantSubject, Post,
    Voter,
};
pub use config::Config;
pub use db::role::{ROLE_ADMIN, ROLE_SUB_ADMIN, ROLE_USER};
pub use db::user::{NewUser, User, UserUpdate};
pub use db::Database;
pub use error::{BoardError, Result};
pub use web::WebServer;
