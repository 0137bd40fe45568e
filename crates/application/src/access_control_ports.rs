mod acl;
mod audit;
mod relations;
mod roles;

pub use acl::AccessControlListRepository;
pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository};
pub use relations::{ObjectRelationRepository, RelatedObjectResolver};
pub use roles::RoleRepository;
