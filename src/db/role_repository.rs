//! Role persistence and role assignment queries.

use sqlx::SqlitePool;

use super::role::Role;
use crate::{BoardError, Result};

/// Repository for roles and user-role assignments.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all roles.
    pub async fn list(&self) -> Result<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Find a role by name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Role names held by a user, ordered by name.
    pub async fn roles_of(&self, user_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT r.name FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = ?
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    /// Role IDs held by a user.
    pub async fn role_ids_of(&self, user_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT role_id FROM user_roles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// True when the user holds the named role.
    pub async fn has_role(&self, user_id: i64, role_name: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ? AND r.name = ?",
        )
        .bind(user_id)
        .bind(role_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    /// Assign a role to a user. Returns false when the user already
    /// holds the role or the role name is unknown.
    pub async fn assign(&self, user_id: i64, role_name: &str) -> Result<bool> {
        let role = match self.find_by_name(role_name).await? {
            Some(role) => role,
            None => return Ok(false),
        };

        if self.has_role(user_id, role_name).await? {
            return Ok(false);
        }

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Remove a role from a user. Returns false when the user does not
    /// hold the role.
    pub async fn remove(&self, user_id: i64, role_name: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM user_roles
             WHERE user_id = ? AND role_id = (SELECT id FROM roles WHERE name = ?)",
        )
        .bind(user_id)
        .bind(role_name)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::role::{ROLE_ADMIN, ROLE_SUB_ADMIN, ROLE_USER};
    use crate::db::user::NewUser;
    use crate::db::user_repository::UserRepository;
    use crate::db::Database;

    async fn setup() -> (Database, RoleRepository, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let user = users
            .create(&NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "hashed".to_string(),
                display_name: "Alice".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        let roles = RoleRepository::new(db.pool().clone());
        (db, roles, user.id)
    }

    #[tokio::test]
    async fn test_seeded_roles() {
        let (_db, roles, _user_id) = setup().await;
        let all = roles.list().await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![ROLE_ADMIN, ROLE_SUB_ADMIN, ROLE_USER]);
    }

    #[tokio::test]
    async fn test_assign_and_query() {
        let (_db, roles, user_id) = setup().await;

        assert!(roles.assign(user_id, ROLE_USER).await.unwrap());
        assert!(roles.has_role(user_id, ROLE_USER).await.unwrap());
        assert!(!roles.has_role(user_id, ROLE_ADMIN).await.unwrap());
        assert_eq!(roles.roles_of(user_id).await.unwrap(), vec!["User"]);
    }

    #[tokio::test]
    async fn test_assign_duplicate_returns_false() {
        let (_db, roles, user_id) = setup().await;
        assert!(roles.assign(user_id, ROLE_USER).await.unwrap());
        assert!(!roles.assign(user_id, ROLE_USER).await.unwrap());
    }

    #[tokio::test]
    async fn test_assign_unknown_role_returns_false() {
        let (_db, roles, user_id) = setup().await;
        assert!(!roles.assign(user_id, "Moderator").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let (_db, roles, user_id) = setup().await;
        roles.assign(user_id, ROLE_SUB_ADMIN).await.unwrap();
        assert!(roles.remove(user_id, ROLE_SUB_ADMIN).await.unwrap());
        assert!(!roles.remove(user_id, ROLE_SUB_ADMIN).await.unwrap());
        assert!(roles.roles_of(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_ids_of() {
        let (_db, roles, user_id) = setup().await;
        roles.assign(user_id, ROLE_USER).await.unwrap();
        roles.assign(user_id, ROLE_SUB_ADMIN).await.unwrap();
        let ids = roles.role_ids_of(user_id).await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
