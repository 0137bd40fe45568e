use std::sync::Arc;

use custodia_application::{
    AccessControlListAdminService, AccessControlListRepository, AccessControlListService,
    AuditLogRepository, AuditRepository, AuthorizationService, ModelPermissionRegistry,
    ObjectRelationRepository, RelatedObjectResolver, RoleRepository, RoleService,
};
use custodia_infrastructure::{
    InMemoryAccessControlRepository, InMemoryAuditRepository, InMemoryObjectGraph,
    PostgresAccessControlListRepository, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresObjectGraphRepository, PostgresRoleRepository,
};
use sqlx::PgPool;

use crate::api_config::IdentityConfig;
use crate::state::AppState;

/// Port implementations backing one running API.
pub struct RepositorySet {
    pub acl_repository: Arc<dyn AccessControlListRepository>,
    pub role_repository: Arc<dyn RoleRepository>,
    pub resolver: Arc<dyn RelatedObjectResolver>,
    pub relation_repository: Arc<dyn ObjectRelationRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl RepositorySet {
    pub fn postgres(pool: &PgPool) -> Self {
        let object_graph = Arc::new(PostgresObjectGraphRepository::new(pool.clone()));

        Self {
            acl_repository: Arc::new(PostgresAccessControlListRepository::new(pool.clone())),
            role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
            resolver: object_graph.clone(),
            relation_repository: object_graph,
            audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
            audit_log_repository: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        let access_control = Arc::new(InMemoryAccessControlRepository::new());
        let object_graph = Arc::new(InMemoryObjectGraph::new());
        let audit = Arc::new(InMemoryAuditRepository::new());

        Self {
            acl_repository: access_control.clone(),
            role_repository: access_control,
            resolver: object_graph.clone(),
            relation_repository: object_graph,
            audit_repository: audit.clone(),
            audit_log_repository: audit,
        }
    }
}

pub fn build_app_state(
    registry: ModelPermissionRegistry,
    repositories: RepositorySet,
    identity: IdentityConfig,
) -> AppState {
    let acl_service = AccessControlListService::new(
        Arc::new(registry),
        repositories.acl_repository.clone(),
        repositories.role_repository.clone(),
        repositories.resolver,
    );

    AppState {
        acl_admin_service: AccessControlListAdminService::new(
            acl_service.clone(),
            repositories.audit_repository.clone(),
        ),
        role_service: RoleService::new(
            acl_service.clone(),
            repositories.role_repository.clone(),
            repositories.acl_repository,
            repositories.audit_repository,
            repositories.audit_log_repository,
        ),
        authorization_service: AuthorizationService::new(repositories.role_repository),
        relation_repository: repositories.relation_repository,
        acl_service,
        identity: Arc::new(identity),
    }
}
