use std::sync::Arc;

use custodia_core::{AppError, AppResult, UserIdentity};
use custodia_domain::{AccessControlled, AuditAction, ObjectRef, PermissionId, Role, RoleId};
use tracing::info;

use crate::access_control_catalogue::{
    role_create, role_delete, role_edit, role_model, role_view,
};
use crate::{
    AccessControlListRepository, AccessControlListService, AuditEvent, AuditLogEntry,
    AuditLogQuery, AuditLogRepository, AuditRepository, AuthorizationService, DenialPresentation,
    RoleRepository,
};


/// Actor-checked role, group and membership administration.
#[derive(Clone)]
pub struct RoleService {
    acl_service: AccessControlListService,
    authorization_service: AuthorizationService,
    role_repository: Arc<dyn RoleRepository>,
    acl_repository: Arc<dyn AccessControlListRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

enum RoleEdit {
    Grant(PermissionId),
    Revoke(PermissionId),
    AddGroup(String),
    RemoveGroup(String),
}

impl RoleEdit {
    fn describe(&self) -> String {
        match self {
            Self::Grant(permission) => format!("granted '{permission}'"),
            Self::Revoke(permission) => format!("revoked '{permission}'"),
            Self::AddGroup(group) => format!("attached group '{group}'"),
            Self::RemoveGroup(group) => format!("detached group '{group}'"),
        }
    }
}

struct RoleObject {
    role: Role,
    object: ObjectRef,
}

impl AccessControlled for RoleObject {
    fn object_ref(&self) -> ObjectRef {
        self.object.clone()
    }
}

impl RoleService {
    /// Creates a new role service.
    #[must_use]
    pub fn new(
        acl_service: AccessControlListService,
        role_repository: Arc<dyn RoleRepository>,
        acl_repository: Arc<dyn AccessControlListRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            acl_service,
            authorization_service: AuthorizationService::new(role_repository.clone()),
            role_repository,
            acl_repository,
            audit_repository,
            audit_log_repository,
        }
    }

    /// Creates a role.
    pub async fn create_role(&self, actor: &UserIdentity, label: &str) -> AppResult<Role> {
        self.authorization_service
            .require_permission(actor, &role_create()?)
            .await?;

        let role = self.role_repository.create_role(Role::new(label)?).await?;
        info!(role_id = %role.role_id(), label = role.label(), "created role");
        self.audit(
            actor,
            AuditAction::RoleCreated,
            &role,
            format!("created role '{}'", role.label()),
        )
        .await?;

        Ok(role)
    }

    /// Lists the roles the actor may view.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        let model = role_model()?;
        let candidates = self
            .role_repository
            .list_roles()
            .await?
            .into_iter()
            .map(|role| {
                let object = ObjectRef::new(model.clone(), role.role_id().to_string())?;
                Ok(RoleObject { role, object })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(self
            .acl_service
            .restrict(&role_view()?, candidates, actor)
            .await?
            .into_iter()
            .map(|candidate| candidate.role)
            .collect())
    }

    /// Returns one role the actor may view.
    pub async fn get_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<Role> {
        let role = self.find_role(role_id).await?;
        self.require_on_role(actor, &role, &role_view()?, DenialPresentation::NotFound)
            .await?;
        Ok(role)
    }

    /// Deletes a role together with its object entries.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        let role = self.find_role(role_id).await?;
        self.require_on_role(actor, &role, &role_delete()?, DenialPresentation::Forbidden)
            .await?;

        let removed = self.acl_repository.delete_acls_for_role(role_id).await?;
        self.role_repository.delete_role(role_id).await?;
        info!(role_id = %role_id, removed_acls = removed, "deleted role");

        self.audit(
            actor,
            AuditAction::RoleDeleted,
            &role,
            format!("deleted role '{}' and {removed} object entries", role.label()),
        )
        .await
    }

    /// Grants a permission to a role for every object.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<Role> {
        self.acl_service.registry().validate_permission(permission)?;
        self.edit_role(actor, role_id, RoleEdit::Grant(permission.clone()))
            .await
    }

    /// Revokes a global permission from a role.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<Role> {
        self.edit_role(actor, role_id, RoleEdit::Revoke(permission.clone()))
            .await
    }

    /// Attaches a group to a role.
    pub async fn add_group(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        group: &str,
    ) -> AppResult<Role> {
        let group = Role::group_name(group)?;
        self.edit_role(actor, role_id, RoleEdit::AddGroup(group))
            .await
    }

    /// Detaches a group from a role.
    pub async fn remove_group(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        group: &str,
    ) -> AppResult<Role> {
        self.edit_role(actor, role_id, RoleEdit::RemoveGroup(group.trim().to_owned()))
            .await
    }

    /// Adds a subject to a group.
    pub async fn add_group_member(
        &self,
        actor: &UserIdentity,
        group: &str,
        subject: &str,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, &role_edit()?)
            .await?;
        let (group, subject) = membership(group, subject)?;

        self.role_repository.add_group_member(group, subject).await?;
        self.audit_membership(actor, group, format!("added '{subject}' to '{group}'"))
            .await
    }

    /// Removes a subject from a group.
    pub async fn remove_group_member(
        &self,
        actor: &UserIdentity,
        group: &str,
        subject: &str,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, &role_edit()?)
            .await?;
        let (group, subject) = membership(group, subject)?;

        self.role_repository
            .remove_group_member(group, subject)
            .await?;
        self.audit_membership(actor, group, format!("removed '{subject}' from '{group}'"))
            .await
    }

    /// Lists the subjects of a group.
    pub async fn list_group_members(
        &self,
        actor: &UserIdentity,
        group: &str,
    ) -> AppResult<Vec<String>> {
        self.authorization_service
            .require_permission(actor, &role_view()?)
            .await?;
        self.role_repository.list_group_members(group).await
    }

    /// Lists recent administration audit entries.
    pub async fn list_audit_entries(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.authorization_service
            .require_permission(actor, &role_view()?)
            .await?;
        self.audit_log_repository.list_recent_entries(query).await
    }

    async fn edit_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        edit: RoleEdit,
    ) -> AppResult<Role> {
        let role = self.find_role(role_id).await?;
        self.require_on_role(actor, &role, &role_edit()?, DenialPresentation::Forbidden)
            .await?;

        let repository = &self.role_repository;
        let changed = match &edit {
            RoleEdit::Grant(permission) => {
                repository.add_role_permission(role_id, permission).await?
            }
            RoleEdit::Revoke(permission) => {
                repository.remove_role_permission(role_id, permission).await?
            }
            RoleEdit::AddGroup(group) => repository.add_role_group(role_id, group).await?,
            RoleEdit::RemoveGroup(group) => repository.remove_role_group(role_id, group).await?,
        };
        if !changed {
            return Ok(role);
        }

        let role = self.find_role(role_id).await?;
        self.audit(actor, AuditAction::RoleEdited, &role, edit.describe())
            .await?;

        Ok(role)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.role_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn require_on_role(
        &self,
        actor: &UserIdentity,
        role: &Role,
        permission: &PermissionId,
        presentation: DenialPresentation,
    ) -> AppResult<()> {
        let object = ObjectRef::new(role_model()?, role.role_id().to_string())?;
        self.acl_service
            .access_check(&object, permission, actor)
            .await?
            .require(presentation)
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        role: &Role,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "role".to_owned(),
                resource_id: role.role_id().to_string(),
                detail: Some(detail),
            })
            .await
    }

    async fn audit_membership(
        &self,
        actor: &UserIdentity,
        group: &str,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::GroupMembershipChanged,
                resource_type: "group".to_owned(),
                resource_id: group.to_owned(),
                detail: Some(detail),
            })
            .await
    }
}

fn membership<'a>(group: &'a str, subject: &'a str) -> AppResult<(&'a str, &'a str)> {
    let group = group.trim();
    let subject = subject.trim();
    if group.is_empty() || subject.is_empty() {
        return Err(AppError::Validation(
            "group and subject must not be empty".to_owned(),
        ));
    }

    Ok((group, subject))
}
