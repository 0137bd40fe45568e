use std::sync::Arc;

use custodia_core::{AppError, AppResult};
use custodia_domain::{AccessControlList, ObjectRef, PermissionId, RoleId};

use crate::{
    AccessControlListRepository, AuthorizationService, ModelPermissionRegistry,
    RelatedObjectResolver, RoleRepository,
};

mod conditions;
mod grants;
mod inherited;
mod restrict;

#[cfg(test)]
mod tests;

pub use conditions::{AclCondition, MAX_INHERITANCE_DEPTH};
pub use restrict::AccessExplanation;

/// Effect of a grant or revoke on the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclChange {
    /// A new entry was stored for the (target, role) pair.
    Created,
    /// The permission set of an existing entry changed.
    Edited,
    /// The last permission was revoked and the entry removed.
    Deleted,
    /// Nothing had to be written.
    Unchanged,
}

/// Outcome of a grant or revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclMutation {
    /// What happened to storage.
    pub change: AclChange,
    /// Entry state after the operation; `None` when no entry existed.
    pub acl: Option<AccessControlList>,
}

/// Result of a single-object access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessCheck {
    /// The user may access the object.
    Granted,
    /// The user may not access the object.
    Denied {
        /// Object that was checked.
        target: ObjectRef,
        /// Permission that was missing.
        permission: PermissionId,
    },
}

/// How a denied access check is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialPresentation {
    /// Report denial as a missing object, hiding its existence.
    NotFound,
    /// Report denial as a permission failure.
    Forbidden,
}

impl AccessCheck {
    /// Returns whether access was granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Converts a denial into the error kind chosen by the caller.
    pub fn require(self, presentation: DenialPresentation) -> AppResult<()> {
        match self {
            Self::Granted => Ok(()),
            Self::Denied { target, permission } => Err(match presentation {
                DenialPresentation::NotFound => {
                    AppError::NotFound(format!("object '{target}' was not found"))
                }
                DenialPresentation::Forbidden => AppError::Forbidden(format!(
                    "permission '{permission}' is required on '{target}'"
                )),
            }),
        }
    }
}

/// Application service for object-level grants and result-set restriction.
#[derive(Clone)]
pub struct AccessControlListService {
    registry: Arc<ModelPermissionRegistry>,
    authorization_service: AuthorizationService,
    acl_repository: Arc<dyn AccessControlListRepository>,
    role_repository: Arc<dyn RoleRepository>,
    resolver: Arc<dyn RelatedObjectResolver>,
}

impl AccessControlListService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        registry: Arc<ModelPermissionRegistry>,
        acl_repository: Arc<dyn AccessControlListRepository>,
        role_repository: Arc<dyn RoleRepository>,
        resolver: Arc<dyn RelatedObjectResolver>,
    ) -> Self {
        Self {
            registry,
            authorization_service: AuthorizationService::new(role_repository.clone()),
            acl_repository,
            role_repository,
            resolver,
        }
    }

    /// Returns the registry the service validates against.
    #[must_use]
    pub fn registry(&self) -> &ModelPermissionRegistry {
        self.registry.as_ref()
    }

    /// Lists every entry attached to an object.
    pub async fn list_acls_for_object(
        &self,
        target: &ObjectRef,
    ) -> AppResult<Vec<AccessControlList>> {
        self.ensure_registered(target)?;
        self.acl_repository.list_acls_for_object(target).await
    }

    fn ensure_registered(&self, target: &ObjectRef) -> AppResult<()> {
        if self.registry.is_registered(target.model()) {
            Ok(())
        } else {
            Err(AppError::UnknownModel(target.model().to_string()))
        }
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<custodia_domain::Role> {
        self.role_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}
