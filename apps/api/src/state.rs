use std::sync::Arc;

use custodia_application::{
    AccessControlListAdminService, AccessControlListService, AuthorizationService,
    ObjectRelationRepository, RoleService,
};

use crate::api_config::IdentityConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub acl_service: AccessControlListService,
    pub acl_admin_service: AccessControlListAdminService,
    pub role_service: RoleService,
    pub authorization_service: AuthorizationService,
    pub relation_repository: Arc<dyn ObjectRelationRepository>,
    pub identity: Arc<IdentityConfig>,
}
