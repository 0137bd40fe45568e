use tracing::info;

use super::*;

impl AccessControlListService {
    /// Grants `permission` to `role_id` on one object.
    ///
    /// The permission must be registered for the model type of the target.
    /// Granting an already held permission writes nothing.
    pub async fn grant(
        &self,
        target: &ObjectRef,
        permission: &PermissionId,
        role_id: RoleId,
    ) -> AppResult<AclMutation> {
        if !self.registry.is_applicable(target.model(), permission) {
            return Err(AppError::PermissionNotValidForClass {
                permission: permission.storage_value(),
                model: target.model().to_string(),
            });
        }

        self.require_role(role_id).await?;

        let mutation = self
            .acl_repository
            .add_permission(target, role_id, permission)
            .await?;
        if mutation.change != AclChange::Unchanged {
            info!(
                target = %target,
                permission = %permission,
                role_id = %role_id,
                created = mutation.change == AclChange::Created,
                "granted object permission"
            );
        }

        Ok(mutation)
    }

    /// Revokes `permission` from `role_id` on one object.
    ///
    /// Revoking a permission that was never granted is a no-op. The entry is
    /// deleted once its last permission is gone.
    pub async fn revoke(
        &self,
        target: &ObjectRef,
        permission: &PermissionId,
        role_id: RoleId,
    ) -> AppResult<AclMutation> {
        let mutation = self
            .acl_repository
            .remove_permission(target, role_id, permission)
            .await?;
        if mutation.change != AclChange::Unchanged {
            info!(
                target = %target,
                permission = %permission,
                role_id = %role_id,
                deleted = mutation.change == AclChange::Deleted,
                "revoked object permission"
            );
        }

        Ok(mutation)
    }
}
