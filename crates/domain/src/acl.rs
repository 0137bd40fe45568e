use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ObjectRef, PermissionId, RoleId};

/// Unique identifier for an access control list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AclId(Uuid);

impl AclId {
    /// Creates a new random entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entry identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AclId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AclId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Permissions one role holds on one specific object.
///
/// Storage keeps at most one entry per (target, role) pair and drops the entry
/// once its permission set is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    acl_id: AclId,
    target: ObjectRef,
    role_id: RoleId,
    permissions: BTreeSet<PermissionId>,
}

impl AccessControlList {
    /// Creates an entry with no permissions.
    #[must_use]
    pub fn new(target: ObjectRef, role_id: RoleId) -> Self {
        Self {
            acl_id: AclId::new(),
            target,
            role_id,
            permissions: BTreeSet::new(),
        }
    }

    /// Rehydrates an entry from storage.
    #[must_use]
    pub fn from_parts(
        acl_id: AclId,
        target: ObjectRef,
        role_id: RoleId,
        permissions: BTreeSet<PermissionId>,
    ) -> Self {
        Self {
            acl_id,
            target,
            role_id,
            permissions,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn acl_id(&self) -> AclId {
        self.acl_id
    }

    /// Returns the object the entry applies to.
    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// Returns the role holding the permissions.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the permissions granted on the target.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<PermissionId> {
        &self.permissions
    }

    /// Returns whether the entry grants the permission.
    #[must_use]
    pub fn has_permission(&self, permission: &PermissionId) -> bool {
        self.permissions.contains(permission)
    }

    /// Adds a permission. Returns `false` when it was already present.
    pub fn add_permission(&mut self, permission: PermissionId) -> bool {
        self.permissions.insert(permission)
    }

    /// Removes a permission. Returns `false` when it was absent.
    pub fn remove_permission(&mut self, permission: &PermissionId) -> bool {
        self.permissions.remove(permission)
    }

    /// Returns whether no permission is left on the entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
