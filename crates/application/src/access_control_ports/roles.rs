use async_trait::async_trait;

use custodia_core::AppResult;
use custodia_domain::{PermissionId, Role, RoleId};

/// Repository port for roles and group membership.
///
/// Permission and group edits touch one row each and report whether they
/// changed anything; they fail with `NotFound` when the role is missing.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role. Labels are unique.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists every role ordered by label.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Grants a global permission to a role.
    async fn add_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool>;

    /// Revokes a global permission from a role.
    async fn remove_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool>;

    /// Attaches a group to a role.
    async fn add_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool>;

    /// Detaches a group from a role.
    async fn remove_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool>;

    /// Deletes a role.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Adds a subject to a group.
    async fn add_group_member(&self, group: &str, subject: &str) -> AppResult<()>;

    /// Removes a subject from a group.
    async fn remove_group_member(&self, group: &str, subject: &str) -> AppResult<()>;

    /// Lists the subjects belonging to a group.
    async fn list_group_members(&self, group: &str) -> AppResult<Vec<String>>;

    /// Lists the roles held by a subject through its groups.
    async fn list_roles_for_subject(&self, subject: &str) -> AppResult<Vec<Role>>;
}
