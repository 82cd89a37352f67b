//! Request handlers for the web API.

pub mod auth;
pub mod category;
pub mod comment;
pub mod post;

use axum::http::HeaderMap;

use crate::auth::session::SessionClaims;
use crate::auth::{AuthService, RoleService};
use crate::board::access::Caller;
use crate::board::{BoardService, CategoryRepository};
use crate::config::AuthConfig;
use crate::db::role_repository::RoleRepository;
use crate::db::user_repository::UserRepository;
use crate::db::Database;
use crate::web::error::ApiError;

/// Shared application state.
pub struct AppState {
    /// Registration and login.
    pub auth: AuthService,
    /// Posts, comments, votes, and category access.
    pub board: BoardService,
    /// Role membership.
    pub roles: RoleService,
    /// User lookups.
    pub users: UserRepository,
    /// Category lookups.
    pub categories: CategoryRepository,
}

impl AppState {
    /// Wire up all services over one database.
    pub fn new(db: &Database, auth_config: &AuthConfig) -> Self {
        let pool = db.pool().clone();
        let users = UserRepository::new(pool.clone());
        let roles = RoleRepository::new(pool.clone());
        let categories = CategoryRepository::new(pool.clone());

        let access = crate::board::AccessService::new(categories.clone(), roles.clone());
        let board = BoardService::new(
            access,
            crate::board::PostRepository::new(pool.clone()),
            crate::board::CommentRepository::new(pool.clone()),
        );

        Self {
            auth: AuthService::new(users.clone(), roles.clone(), auth_config),
            board,
            roles: RoleService::new(roles),
            users,
            categories,
        }
    }

    /// Resolve the caller identity for a request. Role membership is
    /// read fresh from the database rather than trusted from the
    /// session claims.
    pub async fn caller(&self, session: Option<&SessionClaims>) -> Result<Caller, ApiError> {
        self.board
            .access()
            .resolve_caller(session.map(|claims| claims.sub))
            .await
            .map_err(ApiError::from)
    }
}

/// Best-effort client address for rate limiting and anonymous votes.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_from_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.1.2.3, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.1.2.3");
    }

    #[test]
    fn test_client_ip_default() {
        assert_eq!(client_ip(&HeaderMap::new()), "127.0.0.1");
    }
}
