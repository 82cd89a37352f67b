//! Role model types.

use serde::{Deserialize, Serialize};

/// Role name for full administrators.
pub const ROLE_ADMIN: &str = "Admin";
/// Role name for limited administrators.
pub const ROLE_SUB_ADMIN: &str = "SubAdmin";
/// Default role assigned at registration.
pub const ROLE_USER: &str = "User";

/// A named role that can be assigned to users and granted category access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Unique role ID.
    pub id: i64,
    /// Role name, unique across the board.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_constants_distinct() {
        assert_ne!(ROLE_ADMIN, ROLE_SUB_ADMIN);
        assert_ne!(ROLE_SUB_ADMIN, ROLE_USER);
        assert_ne!(ROLE_ADMIN, ROLE_USER);
    }
}
