//! User persistence.

use sqlx::SqlitePool;

use super::user::{NewUser, User, UserUpdate};
use crate::{BoardError, Result};

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns `None` when the username or email
    /// is already taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        let taken: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        if taken.is_some() {
            return Ok(None);
        }

        let result = sqlx::query(
            "INSERT INTO users (username, email, password, display_name)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.display_name)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        let user = self
            .find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| BoardError::Database("created user not found".to_string()))?;
        Ok(Some(user))
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Find a user by email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Apply a partial update to a user. No-op when the update is empty.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut sets: Vec<&str> = Vec::new();
        if update.email.is_some() {
            sets.push("email = ?");
        }
        if update.password.is_some() {
            sets.push("password = ?");
        }
        if update.display_name.is_some() {
            sets.push("display_name = ?");
        }
        if update.is_active.is_some() {
            sets.push("is_active = ?");
        }
        sets.push("updated_at = datetime('now')");

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(email) = &update.email {
            query = query.bind(email);
        }
        if let Some(password) = &update.password {
            query = query.bind(password);
        }
        if let Some(display_name) = &update.display_name {
            query = query.bind(display_name);
        }
        if let Some(is_active) = update.is_active {
            query = query.bind(is_active);
        }
        query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(id).await
    }
}
