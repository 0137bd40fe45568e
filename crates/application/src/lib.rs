//! Application services and ports.

#![forbid(unsafe_code)]

pub mod access_control_catalogue;

mod access_control_admin_service;
mod access_control_ports;
mod access_control_service;
mod authorization_service;
mod permission_registry;
mod role_service;

#[cfg(test)]
mod test_support;

pub use access_control_admin_service::AccessControlListAdminService;
pub use access_control_ports::{
    AccessControlListRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, ObjectRelationRepository, RelatedObjectResolver, RoleRepository,
};
pub use access_control_service::{
    AccessCheck, AccessControlListService, AccessExplanation, AclChange, AclCondition,
    AclMutation, DenialPresentation, MAX_INHERITANCE_DEPTH,
};
pub use authorization_service::AuthorizationService;
pub use permission_registry::{ModelPermissionRegistry, ModelPermissionRegistryBuilder};
pub use role_service::RoleService;
