use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use custodia_core::{AppError, AppResult};
use custodia_domain::{AccessControlList, ModelType, ObjectRef, PermissionId, Role, RoleId};

use crate::{
    AccessControlListRepository, AclChange, AclMutation, AuditEvent, AuditRepository,
    RelatedObjectResolver, RoleRepository,
};

pub(crate) fn model(app_label: &str, name: &str) -> ModelType {
    ModelType::new(app_label, name).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn object(app_label: &str, name: &str, object_id: &str) -> ObjectRef {
    ObjectRef::new(model(app_label, name), object_id).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn permission(value: &str) -> PermissionId {
    value.parse().unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    roles: Mutex<HashMap<RoleId, Role>>,
    members: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl FakeRoleRepository {
    /// Seeds a role whose single group contains `subject`.
    pub(crate) async fn seed_role_for(
        &self,
        label: &str,
        subject: &str,
        permissions: &[PermissionId],
    ) -> Role {
        let mut role = Role::new(label).unwrap_or_else(|_| unreachable!());
        for permission in permissions {
            role.grant(permission.clone());
        }
        let group = format!("{label}-group");
        role.add_group(group.as_str()).unwrap_or_else(|_| unreachable!());

        self.roles.lock().await.insert(role.role_id(), role.clone());
        self.members
            .lock()
            .await
            .entry(group)
            .or_default()
            .insert(subject.to_owned());

        role
    }

    async fn edit<F>(&self, role_id: RoleId, change: F) -> AppResult<bool>
    where
        F: FnOnce(&mut Role) -> AppResult<bool> + Send,
    {
        match self.roles.lock().await.get_mut(&role_id) {
            Some(role) => change(role),
            None => Err(AppError::NotFound(format!("role '{role_id}' was not found"))),
        }
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles.values().any(|existing| existing.label() == role.label()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.label()
            )));
        }

        roles.insert(role.role_id(), role.clone());
        Ok(role)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.lock().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.lock().await.values().cloned().collect();
        roles.sort_by(|left, right| left.label().cmp(right.label()));
        Ok(roles)
    }

    async fn add_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.edit(role_id, |role| Ok(role.grant(permission.clone())))
            .await
    }

    async fn remove_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.edit(role_id, |role| Ok(role.revoke(permission))).await
    }

    async fn add_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.edit(role_id, |role| role.add_group(group)).await
    }

    async fn remove_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.edit(role_id, |role| Ok(role.remove_group(group))).await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.lock().await.remove(&role_id);
        Ok(())
    }

    async fn add_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        self.members
            .lock()
            .await
            .entry(group.to_owned())
            .or_default()
            .insert(subject.to_owned());
        Ok(())
    }

    async fn remove_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        if let Some(members) = self.members.lock().await.get_mut(group) {
            members.remove(subject);
        }
        Ok(())
    }

    async fn list_group_members(&self, group: &str) -> AppResult<Vec<String>> {
        Ok(self
            .members
            .lock()
            .await
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_roles_for_subject(&self, subject: &str) -> AppResult<Vec<Role>> {
        let members = self.members.lock().await;
        let groups: HashSet<&String> = members
            .iter()
            .filter_map(|(group, subjects)| subjects.contains(subject).then_some(group))
            .collect();

        Ok(self
            .roles
            .lock()
            .await
            .values()
            .filter(|role| role.groups().iter().any(|group| groups.contains(group)))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeAccessControlListRepository {
    pub(crate) acls: Mutex<HashMap<(ObjectRef, RoleId), AccessControlList>>,
    pub(crate) writes: Mutex<usize>,
}

#[async_trait]
impl AccessControlListRepository for FakeAccessControlListRepository {
    async fn find_acl(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<Option<AccessControlList>> {
        Ok(self
            .acls
            .lock()
            .await
            .get(&(target.clone(), role_id))
            .cloned())
    }

    async fn add_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation> {
        tokio::task::yield_now().await;
        let mut acls = self.acls.lock().await;
        let key = (target.clone(), role_id);
        let change = match acls.get_mut(&key) {
            Some(acl) => {
                if acl.add_permission(permission.clone()) {
                    AclChange::Edited
                } else {
                    AclChange::Unchanged
                }
            }
            None => {
                let mut acl = AccessControlList::new(target.clone(), role_id);
                acl.add_permission(permission.clone());
                acls.insert(key.clone(), acl);
                AclChange::Created
            }
        };
        if change != AclChange::Unchanged {
            *self.writes.lock().await += 1;
        }

        Ok(AclMutation {
            change,
            acl: acls.get(&key).cloned(),
        })
    }

    async fn remove_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation> {
        tokio::task::yield_now().await;
        let mut acls = self.acls.lock().await;
        let key = (target.clone(), role_id);
        let Some(acl) = acls.get_mut(&key) else {
            return Ok(AclMutation {
                change: AclChange::Unchanged,
                acl: None,
            });
        };
        if !acl.remove_permission(permission) {
            return Ok(AclMutation {
                change: AclChange::Unchanged,
                acl: Some(acl.clone()),
            });
        }

        *self.writes.lock().await += 1;
        let remaining = acl.clone();
        let change = if remaining.is_empty() {
            acls.remove(&key);
            AclChange::Deleted
        } else {
            AclChange::Edited
        };

        Ok(AclMutation {
            change,
            acl: Some(remaining),
        })
    }

    async fn delete_acls_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut acls = self.acls.lock().await;
        let before = acls.len();
        acls.retain(|(_, stored_role_id), _| *stored_role_id != role_id);
        Ok((before - acls.len()) as u64)
    }

    async fn list_acls_for_object(&self, target: &ObjectRef) -> AppResult<Vec<AccessControlList>> {
        Ok(self
            .acls
            .lock()
            .await
            .values()
            .filter(|acl| acl.target() == target)
            .cloned()
            .collect())
    }

    async fn list_granted_objects(
        &self,
        role_ids: &[RoleId],
        permission: &PermissionId,
    ) -> AppResult<HashSet<ObjectRef>> {
        Ok(self
            .acls
            .lock()
            .await
            .values()
            .filter(|acl| role_ids.contains(&acl.role_id()) && acl.has_permission(permission))
            .map(|acl| acl.target().clone())
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeRelations {
    relations: Mutex<HashMap<(ObjectRef, String), ObjectRef>>,
}

impl FakeRelations {
    pub(crate) async fn link(&self, child: &ObjectRef, relation: &str, parent: &ObjectRef) {
        self.relations
            .lock()
            .await
            .insert((child.clone(), relation.to_owned()), parent.clone());
    }
}

#[async_trait]
impl RelatedObjectResolver for FakeRelations {
    async fn resolve_related(
        &self,
        object: &ObjectRef,
        relation: &str,
    ) -> AppResult<Option<ObjectRef>> {
        Ok(self
            .relations
            .lock()
            .await
            .get(&(object.clone(), relation.to_owned()))
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
