//! Category access control.
//!
//! Access decisions are pure functions over a category, the caller's
//! identity, and the caller's grants. The service resolves identity
//! and grants from the database, then evaluates in memory, so listing
//! every category's access costs two queries regardless of how many
//! categories exist.

use super::category_repository::CategoryRepository;
use super::types::{AccessTier, Category, CategoryGrant, GrantSubject};
use crate::db::role::ROLE_ADMIN;
use crate::db::role_repository::RoleRepository;
use crate::{BoardError, Result};

/// The caller's identity for access decisions. Built once per request
/// and passed explicitly.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// `None` for anonymous callers.
    pub user_id: Option<i64>,
    /// Whether the caller holds the Admin role.
    pub is_admin: bool,
    /// IDs of all roles the caller holds.
    pub role_ids: Vec<i64>,
}

impl Caller {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// What a caller may do in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CategoryAccess {
    pub can_read: bool,
    pub can_write: bool,
    pub can_manage: bool,
}

impl CategoryAccess {
    pub const NONE: CategoryAccess = CategoryAccess {
        can_read: false,
        can_write: false,
        can_manage: false,
    };
}

/// Highest tier the caller's grants give in a category.
fn granted_tier(caller: &Caller, grants: &[CategoryGrant], category_id: i64) -> Option<AccessTier> {
    grants
        .iter()
        .filter(|g| g.category_id == category_id)
        .filter(|g| match g.subject {
            GrantSubject::User(id) => caller.user_id == Some(id),
            GrantSubject::Role(id) => caller.role_ids.contains(&id),
        })
        .map(|g| g.tier)
        .max()
}

/// Decide what a caller may do in a category.
///
/// `grants` may contain grants for other categories; only those for
/// this category and this caller count.
pub fn evaluate_access(
    category: &Category,
    caller: &Caller,
    grants: &[CategoryGrant],
) -> CategoryAccess {
    // Inactive categories are invisible, even to administrators
    if !category.is_active {
        return CategoryAccess::NONE;
    }

    if category.require_auth && !caller.is_authenticated() {
        return CategoryAccess::NONE;
    }

    let tier = granted_tier(caller, grants, category.id);

    let can_read = category.is_public
        || caller.is_admin
        || tier >= Some(AccessTier::Read);

    let can_write = can_read
        && (caller.is_admin || category.is_public || tier >= Some(AccessTier::Write));

    // Manage does not require read: an admin can manage a private
    // category they hold no grant in
    let can_manage = caller.is_admin || tier == Some(AccessTier::Manage);

    CategoryAccess {
        can_read,
        can_write,
        can_manage,
    }
}

/// Access control service over the category store.
#[derive(Debug, Clone)]
pub struct AccessService {
    categories: CategoryRepository,
    roles: RoleRepository,
}

impl AccessService {
    pub fn new(categories: CategoryRepository, roles: RoleRepository) -> Self {
        Self { categories, roles }
    }

    /// Build a caller from an optional user ID, resolving role
    /// membership from the database.
    pub async fn resolve_caller(&self, user_id: Option<i64>) -> Result<Caller> {
        let user_id = match user_id {
            Some(id) => id,
            None => return Ok(Caller::anonymous()),
        };
        Ok(Caller {
            user_id: Some(user_id),
            is_admin: self.roles.has_role(user_id, ROLE_ADMIN).await?,
            role_ids: self.roles.role_ids_of(user_id).await?,
        })
    }

    async fn grants_for(&self, caller: &Caller) -> Result<Vec<CategoryGrant>> {
        match caller.user_id {
            Some(user_id) => {
                self.categories
                    .grants_for_caller(user_id, &caller.role_ids)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Evaluate a single category for a caller.
    pub async fn access_for(&self, category: &Category, caller: &Caller) -> Result<CategoryAccess> {
        let grants = self.grants_for(caller).await?;
        Ok(evaluate_access(category, caller, &grants))
    }

    /// Evaluate a category by ID. Unknown categories are a not-found
    /// error.
    pub async fn access_for_id(&self, category_id: i64, caller: &Caller) -> Result<CategoryAccess> {
        let category = self
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| BoardError::NotFound("category".to_string()))?;
        self.access_for(&category, caller).await
    }

    /// All active categories the caller can read, with their access
    /// flags. Two queries total: the category list and the caller's
    /// grants.
    pub async fn accessible_categories(
        &self,
        caller: &Caller,
    ) -> Result<Vec<(Category, CategoryAccess)>> {
        let categories = self.categories.list_active().await?;
        let grants = self.grants_for(caller).await?;

        Ok(categories
            .into_iter()
            .filter_map(|category| {
                let access = evaluate_access(&category, caller, &grants);
                access.can_read.then_some((category, access))
            })
            .collect())
    }

    /// Grant a tier on a category, replacing any existing grant for
    /// the same subject.
    pub async fn grant(
        &self,
        category_id: i64,
        subject: GrantSubject,
        tier: AccessTier,
    ) -> Result<CategoryGrant> {
        if self.categories.find_by_id(category_id).await?.is_none() {
            return Err(BoardError::NotFound("category".to_string()));
        }
        self.categories.grant(category_id, subject, tier).await
    }

    /// Revoke a subject's grant on a category.
    pub async fn revoke(&self, category_id: i64, subject: GrantSubject) -> Result<bool> {
        self.categories.revoke(category_id, subject).await
    }
}
