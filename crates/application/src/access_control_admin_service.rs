use std::collections::BTreeSet;
use std::sync::Arc;

use custodia_core::{AppResult, UserIdentity};
use custodia_domain::{AccessControlList, AuditAction, ObjectRef, PermissionId, RoleId};

use crate::access_control_catalogue::{acl_edit, acl_view};
use crate::{
    AccessControlListService, AclChange, AclMutation, AuditEvent, AuditRepository,
    DenialPresentation,
};


/// Actor-checked access control administration with audit trail.
#[derive(Clone)]
pub struct AccessControlListAdminService {
    acl_service: AccessControlListService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessControlListAdminService {
    /// Creates a new administration service.
    #[must_use]
    pub fn new(
        acl_service: AccessControlListService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            acl_service,
            audit_repository,
        }
    }

    /// Lists the entries of an object the actor may view entries on.
    pub async fn list_acls(
        &self,
        actor: &UserIdentity,
        target: &ObjectRef,
    ) -> AppResult<Vec<AccessControlList>> {
        self.require_on_target(actor, target, &acl_view()?).await?;
        self.acl_service.list_acls_for_object(target).await
    }

    /// Grants an object permission to a role on behalf of the actor.
    pub async fn grant(
        &self,
        actor: &UserIdentity,
        target: &ObjectRef,
        permission: &PermissionId,
        role_id: RoleId,
    ) -> AppResult<AclMutation> {
        self.require_on_target(actor, target, &acl_edit()?).await?;

        let mutation = self.acl_service.grant(target, permission, role_id).await?;
        self.record(actor, &mutation, format!("granted '{permission}' to role '{role_id}'"))
            .await?;

        Ok(mutation)
    }

    /// Revokes an object permission from a role on behalf of the actor.
    pub async fn revoke(
        &self,
        actor: &UserIdentity,
        target: &ObjectRef,
        permission: &PermissionId,
        role_id: RoleId,
    ) -> AppResult<AclMutation> {
        self.require_on_target(actor, target, &acl_edit()?).await?;

        let mutation = self.acl_service.revoke(target, permission, role_id).await?;
        self.record(
            actor,
            &mutation,
            format!("revoked '{permission}' from role '{role_id}'"),
        )
        .await?;

        Ok(mutation)
    }

    /// Returns the permissions a role inherits on an object.
    pub async fn inherited_permissions(
        &self,
        actor: &UserIdentity,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        self.require_on_target(actor, target, &acl_view()?).await?;
        self.acl_service
            .get_inherited_permissions(target, role_id)
            .await
    }

    async fn require_on_target(
        &self,
        actor: &UserIdentity,
        target: &ObjectRef,
        permission: &PermissionId,
    ) -> AppResult<()> {
        self.acl_service
            .access_check(target, permission, actor)
            .await?
            .require(DenialPresentation::Forbidden)
    }

    async fn record(
        &self,
        actor: &UserIdentity,
        mutation: &AclMutation,
        detail: String,
    ) -> AppResult<()> {
        let action = match mutation.change {
            AclChange::Created => AuditAction::AclCreated,
            AclChange::Edited => AuditAction::AclEdited,
            AclChange::Deleted => AuditAction::AclDeleted,
            AclChange::Unchanged => return Ok(()),
        };
        let Some(acl) = mutation.acl.as_ref() else {
            return Ok(());
        };

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "access_control_list".to_owned(),
                resource_id: acl.acl_id().to_string(),
                detail: Some(format!("{detail} on '{}'", acl.target())),
            })
            .await
    }
}
