use custodia_application::AuditLogEntry;
use custodia_domain::Role;
use serde::{Deserialize, Serialize};

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub label: String,
}

/// Incoming payload for granting a global permission to a role.
#[derive(Debug, Deserialize)]
pub struct RolePermissionRequest {
    pub permission: String,
}

/// Incoming payload for linking a group to a role.
#[derive(Debug, Deserialize)]
pub struct RoleGroupRequest {
    pub group: String,
}

/// Incoming payload for group membership changes.
#[derive(Debug, Deserialize)]
pub struct GroupMemberRequest {
    pub subject: String,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub label: String,
    pub permissions: Vec<String>,
    pub groups: Vec<String>,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub subject: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.role_id().to_string(),
            label: value.label().to_owned(),
            permissions: value
                .permissions()
                .iter()
                .map(|permission| permission.storage_value())
                .collect(),
            groups: value.groups().iter().cloned().collect(),
        }
    }
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            subject: value.subject,
            action: value.action,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            detail: value.detail,
            created_at: value.created_at,
        }
    }
}
