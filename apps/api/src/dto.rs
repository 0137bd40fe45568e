mod access;
mod catalogue;
mod common;
mod roles;

pub use access::{
    AclChangeRequest, AclMutationResponse, AclResponse, ConditionResponse, ExplainRequest,
    ExplainResponse, InheritedPermissionsResponse, RestrictRequest, RestrictResponse,
};
pub use catalogue::{ModelResponse, PermissionResponse};
pub use common::{HealthResponse, ObjectRefDto};
pub use roles::{
    AuditLogEntryResponse, CreateRoleRequest, GroupMemberRequest, RoleGroupRequest,
    RolePermissionRequest, RoleResponse,
};
