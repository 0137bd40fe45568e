use std::str::FromStr;

use custodia_core::AppError;
use serde::{Deserialize, Serialize};

/// Reason a user holds a permission without consulting object-level entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// One of the user's roles grants the permission globally.
    RoleGrant,
    /// Superusers bypass every permission check.
    SuperuserOverride,
    /// Staff users bypass every permission check.
    StaffOverride,
}

impl AccessLevel {
    /// Returns a stable label for logs and responses.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleGrant => "role_grant",
            Self::SuperuserOverride => "superuser_override",
            Self::StaffOverride => "staff_override",
        }
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when the first permission of a role is granted on an object.
    AclCreated,
    /// Emitted when an existing object entry gains or loses a permission.
    AclEdited,
    /// Emitted when the last permission of an object entry is revoked.
    AclDeleted,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when role permissions or groups change.
    RoleEdited,
    /// Emitted when a subject joins or leaves a group.
    GroupMembershipChanged,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AclCreated => "acls.acl_created",
            Self::AclEdited => "acls.acl_edited",
            Self::AclDeleted => "acls.acl_deleted",
            Self::RoleCreated => "permissions.role_created",
            Self::RoleDeleted => "permissions.role_deleted",
            Self::RoleEdited => "permissions.role_edited",
            Self::GroupMembershipChanged => "user_management.group_membership_changed",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "acls.acl_created" => Ok(Self::AclCreated),
            "acls.acl_edited" => Ok(Self::AclEdited),
            "acls.acl_deleted" => Ok(Self::AclDeleted),
            "permissions.role_created" => Ok(Self::RoleCreated),
            "permissions.role_deleted" => Ok(Self::RoleDeleted),
            "permissions.role_edited" => Ok(Self::RoleEdited),
            "user_management.group_membership_changed" => Ok(Self::GroupMembershipChanged),
            _ => Err(AppError::Validation(format!(
                "unknown audit action value '{value}'"
            ))),
        }
    }
}
