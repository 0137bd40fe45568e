use std::collections::HashSet;

use custodia_core::UserIdentity;
use custodia_domain::{AccessControlled, AccessLevel, Role};
use tracing::{debug, warn};

use super::conditions::AclConditionBuilder;
use super::*;

/// Diagnostic view of how access to one object is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessExplanation {
    /// Global grant that bypasses object-level checks, if any.
    pub access_level: Option<AccessLevel>,
    /// Inheritance condition built for the object.
    pub condition: AclCondition,
    /// Objects in the condition on which the user holds the permission.
    pub granted_objects: Vec<ObjectRef>,
    /// Final decision.
    pub granted: bool,
}

impl AccessControlListService {
    /// Keeps the candidates the user may access with `permission`.
    ///
    /// A global grant returns every candidate. Otherwise a candidate is kept
    /// when an entry of one of the user's roles grants the permission on the
    /// candidate or on an object it inherits access from. Candidate order is
    /// preserved.
    pub async fn restrict<T>(
        &self,
        permission: &PermissionId,
        candidates: Vec<T>,
        user: &UserIdentity,
    ) -> AppResult<Vec<T>>
    where
        T: AccessControlled + Send,
    {
        let roles = self.authorization_service.roles_for(user).await?;
        if let Some(level) = AuthorizationService::resolve_access_level(user, &roles, permission)
        {
            debug!(
                subject = user.subject(),
                permission = %permission,
                level = level.as_str(),
                "restriction bypassed by global access"
            );
            return Ok(candidates);
        }

        let granted = self.granted_objects(&roles, permission).await?;
        let builder = AclConditionBuilder::new(&self.registry, self.resolver.as_ref());

        let total = candidates.len();
        let mut allowed = Vec::with_capacity(total);
        for candidate in candidates {
            let object = candidate.object_ref();
            if !self.registry.is_registered(object.model()) {
                warn!(model = %object.model(), "restriction requested for unregistered model");
                return Err(AppError::UnknownModel(object.model().to_string()));
            }

            if granted.is_empty() || !self.registry.is_applicable(object.model(), permission) {
                continue;
            }

            if builder.build(&object).await?.evaluate(&granted) {
                allowed.push(candidate);
            }
        }

        debug!(
            subject = user.subject(),
            permission = %permission,
            candidates = total,
            allowed = allowed.len(),
            "restricted candidates"
        );

        Ok(allowed)
    }

    /// Returns the condition deciding access to one object and its outcome.
    pub async fn explain(
        &self,
        target: &ObjectRef,
        permission: &PermissionId,
        user: &UserIdentity,
    ) -> AppResult<AccessExplanation> {
        let roles = self.authorization_service.roles_for(user).await?;
        let access_level = AuthorizationService::resolve_access_level(user, &roles, permission);

        let builder = AclConditionBuilder::new(&self.registry, self.resolver.as_ref());
        let condition = builder.build(target).await?;

        let granted = self.granted_objects(&roles, permission).await?;
        let granted_objects = condition
            .referenced_objects()
            .into_iter()
            .filter(|object| granted.contains(*object))
            .cloned()
            .collect();

        let granted = access_level.is_some()
            || (self.registry.is_applicable(target.model(), permission)
                && condition.evaluate(&granted));

        Ok(AccessExplanation {
            access_level,
            condition,
            granted_objects,
            granted,
        })
    }

    /// Checks access to a single object.
    #[deprecated(note = "filter candidate sets with `restrict` instead")]
    pub async fn check_access(
        &self,
        target: &ObjectRef,
        permission: &PermissionId,
        user: &UserIdentity,
    ) -> AppResult<AccessCheck> {
        self.access_check(target, permission, user).await
    }

    pub(crate) async fn access_check(
        &self,
        target: &ObjectRef,
        permission: &PermissionId,
        user: &UserIdentity,
    ) -> AppResult<AccessCheck> {
        let allowed = self
            .restrict(permission, vec![target.clone()], user)
            .await?;

        if allowed.is_empty() {
            Ok(AccessCheck::Denied {
                target: target.clone(),
                permission: permission.clone(),
            })
        } else {
            Ok(AccessCheck::Granted)
        }
    }

    async fn granted_objects(
        &self,
        roles: &[Role],
        permission: &PermissionId,
    ) -> AppResult<HashSet<ObjectRef>> {
        if roles.is_empty() {
            return Ok(HashSet::new());
        }

        let role_ids: Vec<RoleId> = roles.iter().map(Role::role_id).collect();
        self.acl_repository
            .list_granted_objects(&role_ids, permission)
            .await
    }
}
