//! Role queries and assignment.

use crate::db::role::{Role, ROLE_ADMIN, ROLE_SUB_ADMIN};
use crate::db::role_repository::RoleRepository;
use crate::Result;

/// Service for role membership.
///
/// Thin wrapper over the repository with board-level helpers. Callers
/// enforce who may change role membership; this service only answers
/// and mutates membership itself.
#[derive(Debug, Clone)]
pub struct RoleService {
    roles: RoleRepository,
}

impl RoleService {
    pub fn new(roles: RoleRepository) -> Self {
        Self { roles }
    }

    /// List all roles on the board.
    pub async fn list(&self) -> Result<Vec<Role>> {
        self.roles.list().await
    }

    /// Role names held by a user.
    pub async fn roles_of(&self, user_id: i64) -> Result<Vec<String>> {
        self.roles.roles_of(user_id).await
    }

    /// Assign a role. Returns false when the user already holds the
    /// role or the role name is unknown.
    pub async fn assign(&self, user_id: i64, role_name: &str) -> Result<bool> {
        self.roles.assign(user_id, role_name).await
    }

    /// Remove a role. Returns false when the user does not hold it.
    pub async fn remove(&self, user_id: i64, role_name: &str) -> Result<bool> {
        self.roles.remove(user_id, role_name).await
    }

    /// True when the user holds the named role.
    pub async fn has_role(&self, user_id: i64, role_name: &str) -> Result<bool> {
        self.roles.has_role(user_id, role_name).await
    }

    /// True when the user is a full administrator.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool> {
        self.has_role(user_id, ROLE_ADMIN).await
    }

    /// True when the user is an administrator of either tier.
    pub async fn is_sub_admin_or_higher(&self, user_id: i64) -> Result<bool> {
        Ok(self.has_role(user_id, ROLE_ADMIN).await?
            || self.has_role(user_id, ROLE_SUB_ADMIN).await?)
    }

    /// Whether `actor` may administer `target`'s account. Admins
    /// manage anyone; SubAdmins manage only accounts holding neither
    /// administrative role.
    pub async fn can_manage_user(&self, actor_id: i64, target_id: i64) -> Result<bool> {
        if self.is_admin(actor_id).await? {
            return Ok(true);
        }
        if self.has_role(actor_id, ROLE_SUB_ADMIN).await? {
            return Ok(!self.is_sub_admin_or_higher(target_id).await?);
        }
        Ok(false)
    }
}
