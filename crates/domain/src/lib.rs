//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod acl;
mod content_type;
mod permission;
mod relation;
mod role;
mod security;

pub use acl::{AccessControlList, AclId};
pub use content_type::{AccessControlled, ModelType, ObjectRef};
pub use permission::{Permission, PermissionId, PermissionNamespace};
pub use relation::RelationPath;
pub use role::{Role, RoleId};
pub use security::{AccessLevel, AuditAction};
