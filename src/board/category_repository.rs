//! Category and access grant persistence.

use sqlx::SqlitePool;

use super::types::{AccessTier, Category, CategoryGrant, GrantSubject, NewCategory};
use crate::{BoardError, Result};

/// Repository for categories and their access grants.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a category.
    pub async fn create(&self, new_category: &NewCategory) -> Result<Category> {
        let result = sqlx::query(
            "INSERT INTO categories (name, slug, description, display_order, is_public, require_auth)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_category.name)
        .bind(&new_category.slug)
        .bind(&new_category.description)
        .bind(new_category.display_order)
        .bind(new_category.is_public)
        .bind(new_category.require_auth)
        .execute(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| BoardError::Database("created category not found".to_string()))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// All active categories in display order.
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_active = 1 ORDER BY display_order, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Activate or deactivate a category.
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// All grants on a category.
    pub async fn grants_for_category(&self, category_id: i64) -> Result<Vec<CategoryGrant>> {
        sqlx::query_as::<_, CategoryGrant>(
            "SELECT * FROM category_access WHERE category_id = ? ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Grant a tier to a user or role on a category. An existing grant
    /// for the same subject has its tier replaced.
    pub async fn grant(
        &self,
        category_id: i64,
        subject: GrantSubject,
        tier: AccessTier,
    ) -> Result<CategoryGrant> {
        let (sql, subject_id) = match subject {
            GrantSubject::User(id) => (
                "INSERT INTO category_access (category_id, user_id, tier) VALUES (?, ?, ?)
                 ON CONFLICT (category_id, user_id) WHERE user_id IS NOT NULL
                 DO UPDATE SET tier = excluded.tier",
                id,
            ),
            GrantSubject::Role(id) => (
                "INSERT INTO category_access (category_id, role_id, tier) VALUES (?, ?, ?)
                 ON CONFLICT (category_id, role_id) WHERE role_id IS NOT NULL
                 DO UPDATE SET tier = excluded.tier",
                id,
            ),
        };

        sqlx::query(sql)
            .bind(category_id)
            .bind(subject_id)
            .bind(tier.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;

        let row_sql = match subject {
            GrantSubject::User(_) => {
                "SELECT * FROM category_access WHERE category_id = ? AND user_id = ?"
            }
            GrantSubject::Role(_) => {
                "SELECT * FROM category_access WHERE category_id = ? AND role_id = ?"
            }
        };
        sqlx::query_as::<_, CategoryGrant>(row_sql)
            .bind(category_id)
            .bind(subject_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }

    /// Revoke a subject's grant on a category. Returns false when no
    /// grant existed.
    pub async fn revoke(&self, category_id: i64, subject: GrantSubject) -> Result<bool> {
        let (sql, subject_id) = match subject {
            GrantSubject::User(id) => (
                "DELETE FROM category_access WHERE category_id = ? AND user_id = ?",
                id,
            ),
            GrantSubject::Role(id) => (
                "DELETE FROM category_access WHERE category_id = ? AND role_id = ?",
                id,
            ),
        };
        let result = sqlx::query(sql)
            .bind(category_id)
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// All grants that apply to a caller across every category: the
    /// caller's own user grants plus grants for any of their roles.
    pub async fn grants_for_caller(
        &self,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<Vec<CategoryGrant>> {
        let mut sql = String::from(
            "SELECT * FROM category_access WHERE user_id = ?",
        );
        if !role_ids.is_empty() {
            let placeholders = vec!["?"; role_ids.len()].join(", ");
            sql.push_str(&format!(" OR role_id IN ({})", placeholders));
        }

        let mut query = sqlx::query_as::<_, CategoryGrant>(&sql).bind(user_id);
        for role_id in role_ids {
            query = query.bind(role_id);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BoardError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn sample_category(slug: &str) -> NewCategory {
        NewCategory {
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            display_order: 0,
            is_public: true,
            require_auth: false,
        }
    }

    async fn setup() -> (Database, CategoryRepository) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = CategoryRepository::new(db.pool().clone());
        (db, repo)
    }

    async fn insert_user(db: &Database, name: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, email, password, display_name) VALUES (?, ?, 'x', ?)",
        )
        .bind(name)
        .bind(format!("{}@example.com", name))
        .bind(name)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_db, repo) = setup().await;
        let category = repo.create(&sample_category("general")).await.unwrap();
        assert!(category.is_active);
        assert!(category.is_public);

        let by_slug = repo.find_by_slug("general").await.unwrap().unwrap();
        assert_eq!(by_slug.id, category.id);
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let (_db, repo) = setup().await;
        let a = repo.create(&sample_category("a")).await.unwrap();
        let b = repo.create(&sample_category("b")).await.unwrap();
        repo.set_active(a.id, false).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
    }

    #[tokio::test]
    async fn test_grant_upserts_tier() {
        let (db, repo) = setup().await;
        let category = repo.create(&sample_category("general")).await.unwrap();
        let user_id = insert_user(&db, "alice").await;

        let grant = repo
            .grant(category.id, GrantSubject::User(user_id), AccessTier::Read)
            .await
            .unwrap();
        assert_eq!(grant.tier, AccessTier::Read);

        let grant = repo
            .grant(category.id, GrantSubject::User(user_id), AccessTier::Manage)
            .await
            .unwrap();
        assert_eq!(grant.tier, AccessTier::Manage);

        let grants = repo.grants_for_category(category.id).await.unwrap();
        assert_eq!(grants.len(), 1);
    }

    #[tokio::test]
    async fn test_revoke() {
        let (db, repo) = setup().await;
        let category = repo.create(&sample_category("general")).await.unwrap();
        let user_id = insert_user(&db, "alice").await;

        repo.grant(category.id, GrantSubject::User(user_id), AccessTier::Read)
            .await
            .unwrap();
        assert!(repo
            .revoke(category.id, GrantSubject::User(user_id))
            .await
            .unwrap());
        assert!(!repo
            .revoke(category.id, GrantSubject::User(user_id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_grants_for_caller() {
        let (db, repo) = setup().await;
        let general = repo.create(&sample_category("general")).await.unwrap();
        let private = repo.create(&sample_category("private")).await.unwrap();
        let user_id = insert_user(&db, "alice").await;
        let other_id = insert_user(&db, "bob").await;

        // Role 3 is the seeded User role
        repo.grant(general.id, GrantSubject::User(user_id), AccessTier::Read)
            .await
            .unwrap();
        repo.grant(private.id, GrantSubject::Role(3), AccessTier::Write)
            .await
            .unwrap();
        repo.grant(private.id, GrantSubject::User(other_id), AccessTier::Manage)
            .await
            .unwrap();

        let grants = repo.grants_for_caller(user_id, &[3]).await.unwrap();
        assert_eq!(grants.len(), 2);

        let grants = repo.grants_for_caller(user_id, &[]).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].subject, GrantSubject::User(user_id));
    }
}
