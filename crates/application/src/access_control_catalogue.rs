//! Permissions guarding the access control administration itself.

use custodia_core::AppResult;
use custodia_domain::{ModelType, PermissionId};

use crate::ModelPermissionRegistryBuilder;

/// Namespace of object-level access control permissions.
pub const ACLS_NAMESPACE: &str = "acls";
/// Namespace of role administration permissions.
pub const PERMISSIONS_NAMESPACE: &str = "permissions";

/// Permission to grant and revoke object-level entries.
pub fn acl_edit() -> AppResult<PermissionId> {
    PermissionId::new(ACLS_NAMESPACE, "acl_edit")
}

/// Permission to inspect object-level entries.
pub fn acl_view() -> AppResult<PermissionId> {
    PermissionId::new(ACLS_NAMESPACE, "acl_view")
}

/// Permission to create roles.
pub fn role_create() -> AppResult<PermissionId> {
    PermissionId::new(PERMISSIONS_NAMESPACE, "role_create")
}

/// Permission to delete roles.
pub fn role_delete() -> AppResult<PermissionId> {
    PermissionId::new(PERMISSIONS_NAMESPACE, "role_delete")
}

/// Permission to change role permissions, groups and group members.
pub fn role_edit() -> AppResult<PermissionId> {
    PermissionId::new(PERMISSIONS_NAMESPACE, "role_edit")
}

/// Permission to list roles.
pub fn role_view() -> AppResult<PermissionId> {
    PermissionId::new(PERMISSIONS_NAMESPACE, "role_view")
}

/// Model type of roles.
pub fn role_model() -> AppResult<ModelType> {
    ModelType::new(PERMISSIONS_NAMESPACE, "role")
}

/// Declares the administration namespaces and permissions.
///
/// Roles themselves are access controlled, so the role model is registered
/// with both families of permissions.
pub fn register_access_control_permissions(
    builder: &mut ModelPermissionRegistryBuilder,
) -> AppResult<()> {
    let acls = builder.register_namespace(ACLS_NAMESPACE, "Access control lists")?;
    builder.register_permission(&acls, "acl_edit", "Edit ACLs")?;
    builder.register_permission(&acls, "acl_view", "View ACLs")?;

    let permissions = builder.register_namespace(PERMISSIONS_NAMESPACE, "Permissions")?;
    builder.register_permission(&permissions, "role_create", "Create roles")?;
    builder.register_permission(&permissions, "role_delete", "Delete roles")?;
    builder.register_permission(&permissions, "role_edit", "Edit roles")?;
    builder.register_permission(&permissions, "role_view", "View roles")?;

    builder.register(
        &role_model()?,
        &[
            acl_edit()?,
            acl_view()?,
            role_delete()?,
            role_edit()?,
            role_view()?,
        ],
    )?;

    Ok(())
}
