//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_control_repository;
mod in_memory_audit_repository;
mod in_memory_object_graph;
mod postgres_access_control_list_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_decode;
mod postgres_object_graph_repository;
mod postgres_role_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_access_control_repository::InMemoryAccessControlRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_object_graph::InMemoryObjectGraph;
pub use postgres_access_control_list_repository::PostgresAccessControlListRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_object_graph_repository::PostgresObjectGraphRepository;
pub use postgres_role_repository::PostgresRoleRepository;
