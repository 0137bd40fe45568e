use std::collections::BTreeSet;

use custodia_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionId;

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Named bundle of global permissions, held by the members of its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    label: NonEmptyString,
    permissions: BTreeSet<PermissionId>,
    groups: BTreeSet<String>,
}

impl Role {
    /// Creates an empty role.
    pub fn new(label: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            role_id: RoleId::new(),
            label: NonEmptyString::new(label.into().trim())?,
            permissions: BTreeSet::new(),
            groups: BTreeSet::new(),
        })
    }

    /// Rehydrates a role from storage.
    pub fn from_parts(
        role_id: RoleId,
        label: impl Into<String>,
        permissions: BTreeSet<PermissionId>,
        groups: BTreeSet<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            role_id,
            label: NonEmptyString::new(label)?,
            permissions,
            groups,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the role label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns globally granted permissions.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<PermissionId> {
        &self.permissions
    }

    /// Returns the groups whose members hold this role.
    #[must_use]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Returns whether the role grants the permission globally.
    #[must_use]
    pub fn has_permission(&self, permission: &PermissionId) -> bool {
        self.permissions.contains(permission)
    }

    /// Grants a permission globally. Returns `false` when already granted.
    pub fn grant(&mut self, permission: PermissionId) -> bool {
        self.permissions.insert(permission)
    }

    /// Revokes a global permission. Returns `false` when it was not granted.
    pub fn revoke(&mut self, permission: &PermissionId) -> bool {
        self.permissions.remove(permission)
    }

    /// Attaches a group to the role.
    pub fn add_group(&mut self, group: impl Into<String>) -> AppResult<bool> {
        let group = Self::group_name(group.into().as_str())?;
        Ok(self.groups.insert(group))
    }

    /// Normalizes a group name: trimmed and non-empty.
    pub fn group_name(group: &str) -> AppResult<String> {
        Ok(NonEmptyString::new(group.trim())?.into())
    }

    /// Detaches a group from the role.
    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(group)
    }
}
