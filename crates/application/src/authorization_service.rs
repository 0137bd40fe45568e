use std::sync::Arc;

use custodia_core::{AppError, AppResult, UserIdentity};
use custodia_domain::{AccessLevel, PermissionId, Role};
use tracing::debug;

use crate::RoleRepository;

#[cfg(test)]
mod tests;

/// Application service for global (role based) permission checks.
#[derive(Clone)]
pub struct AuthorizationService {
    role_repository: Arc<dyn RoleRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(role_repository: Arc<dyn RoleRepository>) -> Self {
        Self { role_repository }
    }

    /// Returns why the user holds the permission globally, if it does.
    pub async fn access_level(
        &self,
        user: &UserIdentity,
        permission: &PermissionId,
    ) -> AppResult<Option<AccessLevel>> {
        if let Some(level) = administrative_override(user) {
            return Ok(Some(level));
        }

        let roles = self.roles_for(user).await?;
        Ok(Self::resolve_access_level(user, &roles, permission))
    }

    /// Ensures the user holds at least one of the permissions globally.
    pub async fn check_user_permissions(
        &self,
        user: &UserIdentity,
        permissions: &[PermissionId],
    ) -> AppResult<AccessLevel> {
        if let Some(level) = administrative_override(user) {
            return Ok(level);
        }

        let roles = self.roles_for(user).await?;
        permissions
            .iter()
            .find_map(|permission| Self::resolve_access_level(user, &roles, permission))
            .ok_or_else(|| {
                let names = permissions
                    .iter()
                    .map(PermissionId::storage_value)
                    .collect::<Vec<_>>()
                    .join("', '");
                AppError::Forbidden(format!(
                    "subject '{}' is missing any of the permissions '{names}'",
                    user.subject()
                ))
            })
    }

    /// Ensures the user holds the permission globally.
    pub async fn require_permission(
        &self,
        user: &UserIdentity,
        permission: &PermissionId,
    ) -> AppResult<()> {
        self.check_user_permissions(user, std::slice::from_ref(permission))
            .await
            .map(|_| ())
    }

    /// Returns whether the user currently holds the permission globally.
    pub async fn has_permission(
        &self,
        user: &UserIdentity,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        Ok(self.access_level(user, permission).await?.is_some())
    }

    /// Loads the roles held by the user through group membership.
    pub async fn roles_for(&self, user: &UserIdentity) -> AppResult<Vec<Role>> {
        self.role_repository
            .list_roles_for_subject(user.subject())
            .await
    }

    /// Resolves the access level from already loaded roles.
    #[must_use]
    pub fn resolve_access_level(
        user: &UserIdentity,
        roles: &[Role],
        permission: &PermissionId,
    ) -> Option<AccessLevel> {
        if let Some(level) = administrative_override(user) {
            return Some(level);
        }

        let granted = roles.iter().any(|role| role.has_permission(permission));
        if granted {
            debug!(subject = user.subject(), permission = %permission, "permission granted by role");
        }

        granted.then_some(AccessLevel::RoleGrant)
    }
}

fn administrative_override(user: &UserIdentity) -> Option<AccessLevel> {
    if user.is_superuser() {
        Some(AccessLevel::SuperuserOverride)
    } else if user.is_staff() {
        Some(AccessLevel::StaffOverride)
    } else {
        None
    }
}
