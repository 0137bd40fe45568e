use std::collections::HashSet;

use async_trait::async_trait;

use custodia_core::AppResult;
use custodia_domain::{AccessControlList, ObjectRef, PermissionId, RoleId};

use crate::AclMutation;

/// Repository port for object-level access control entries.
///
/// Mutations are incremental: each one touches a single permission of a
/// single (target, role) entry and must be atomic, so concurrent grants and
/// revokes on the same entry never overwrite each other.
#[async_trait]
pub trait AccessControlListRepository: Send + Sync {
    /// Finds the entry for a target and role.
    async fn find_acl(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<Option<AccessControlList>>;

    /// Adds one permission, creating the entry when the pair has none.
    ///
    /// Reports `Created`, `Edited` or `Unchanged` together with the entry as
    /// stored after the write.
    async fn add_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation>;

    /// Removes one permission and drops the entry once it holds none.
    ///
    /// Reports `Edited`, `Deleted` or `Unchanged`.
    async fn remove_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation>;

    /// Deletes every entry held by a role.
    async fn delete_acls_for_role(&self, role_id: RoleId) -> AppResult<u64>;

    /// Lists every entry attached to one object.
    async fn list_acls_for_object(&self, target: &ObjectRef) -> AppResult<Vec<AccessControlList>>;

    /// Lists the objects on which any of the roles holds the permission.
    async fn list_granted_objects(
        &self,
        role_ids: &[RoleId],
        permission: &PermissionId,
    ) -> AppResult<HashSet<ObjectRef>>;
}
