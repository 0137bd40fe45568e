use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use custodia_application::{AccessControlListRepository, AclChange, AclMutation, RoleRepository};
use custodia_core::{AppError, AppResult};
use custodia_domain::{AccessControlList, ObjectRef, PermissionId, Role, RoleId};
use tokio::sync::RwLock;

#[cfg(test)]
mod tests;

/// In-memory role and object entry store.
///
/// Implements both repositories over one value so deleting a role can drop
/// its entries the way a foreign key cascade would.
#[derive(Debug, Default)]
pub struct InMemoryAccessControlRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
    group_members: RwLock<BTreeMap<String, BTreeSet<String>>>,
    acls: RwLock<HashMap<(ObjectRef, RoleId), AccessControlList>>,
}

impl InMemoryAccessControlRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn edit_role<F>(&self, role_id: RoleId, change: F) -> AppResult<bool>
    where
        F: FnOnce(&mut Role) -> AppResult<bool> + Send,
    {
        match self.roles.write().await.get_mut(&role_id) {
            Some(role) => change(role),
            None => Err(AppError::NotFound(format!("role '{role_id}' was not found"))),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessControlRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
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
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|left, right| left.label().cmp(right.label()));
        Ok(roles)
    }

    async fn add_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.edit_role(role_id, |role| Ok(role.grant(permission.clone())))
            .await
    }

    async fn remove_role_permission(
        &self,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        self.edit_role(role_id, |role| Ok(role.revoke(permission)))
            .await
    }

    async fn add_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.edit_role(role_id, |role| role.add_group(group)).await
    }

    async fn remove_role_group(&self, role_id: RoleId, group: &str) -> AppResult<bool> {
        self.edit_role(role_id, |role| Ok(role.remove_group(group)))
            .await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.write().await.remove(&role_id);
        self.acls
            .write()
            .await
            .retain(|(_, stored_role_id), _| *stored_role_id != role_id);
        Ok(())
    }

    async fn add_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        self.group_members
            .write()
            .await
            .entry(group.to_owned())
            .or_default()
            .insert(subject.to_owned());
        Ok(())
    }

    async fn remove_group_member(&self, group: &str, subject: &str) -> AppResult<()> {
        let mut group_members = self.group_members.write().await;
        if let Some(members) = group_members.get_mut(group) {
            members.remove(subject);
            if members.is_empty() {
                group_members.remove(group);
            }
        }
        Ok(())
    }

    async fn list_group_members(&self, group: &str) -> AppResult<Vec<String>> {
        Ok(self
            .group_members
            .read()
            .await
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_roles_for_subject(&self, subject: &str) -> AppResult<Vec<Role>> {
        let groups: HashSet<String> = self
            .group_members
            .read()
            .await
            .iter()
            .filter_map(|(group, members)| members.contains(subject).then(|| group.clone()))
            .collect();

        let mut roles: Vec<Role> = self
            .roles
            .read()
            .await
            .values()
            .filter(|role| role.groups().iter().any(|group| groups.contains(group)))
            .cloned()
            .collect();
        roles.sort_by(|left, right| left.label().cmp(right.label()));
        Ok(roles)
    }
}

#[async_trait]
impl AccessControlListRepository for InMemoryAccessControlRepository {
    async fn find_acl(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<Option<AccessControlList>> {
        Ok(self
            .acls
            .read()
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
        let mut acls = self.acls.write().await;
        let (change, acl) = match acls.entry((target.clone(), role_id)) {
            Entry::Occupied(entry) => {
                let acl = entry.into_mut();
                let change = if acl.add_permission(permission.clone()) {
                    AclChange::Edited
                } else {
                    AclChange::Unchanged
                };
                (change, acl.clone())
            }
            Entry::Vacant(entry) => {
                let mut acl = AccessControlList::new(target.clone(), role_id);
                acl.add_permission(permission.clone());
                (AclChange::Created, entry.insert(acl).clone())
            }
        };

        Ok(AclMutation {
            change,
            acl: Some(acl),
        })
    }

    async fn remove_permission(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
        permission: &PermissionId,
    ) -> AppResult<AclMutation> {
        let mut acls = self.acls.write().await;
        let Entry::Occupied(mut entry) = acls.entry((target.clone(), role_id)) else {
            return Ok(AclMutation {
                change: AclChange::Unchanged,
                acl: None,
            });
        };

        if !entry.get_mut().remove_permission(permission) {
            return Ok(AclMutation {
                change: AclChange::Unchanged,
                acl: Some(entry.get().clone()),
            });
        }

        let (change, acl) = if entry.get().is_empty() {
            (AclChange::Deleted, entry.remove())
        } else {
            (AclChange::Edited, entry.get().clone())
        };

        Ok(AclMutation {
            change,
            acl: Some(acl),
        })
    }

    async fn delete_acls_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut acls = self.acls.write().await;
        let before = acls.len();
        acls.retain(|(_, stored_role_id), _| *stored_role_id != role_id);
        Ok((before - acls.len()) as u64)
    }

    async fn list_acls_for_object(&self, target: &ObjectRef) -> AppResult<Vec<AccessControlList>> {
        let mut acls: Vec<AccessControlList> = self
            .acls
            .read()
            .await
            .values()
            .filter(|acl| acl.target() == target)
            .cloned()
            .collect();
        acls.sort_by_key(|acl| acl.role_id().as_uuid());
        Ok(acls)
    }

    async fn list_granted_objects(
        &self,
        role_ids: &[RoleId],
        permission: &PermissionId,
    ) -> AppResult<HashSet<ObjectRef>> {
        Ok(self
            .acls
            .read()
            .await
            .values()
            .filter(|acl| role_ids.contains(&acl.role_id()) && acl.has_permission(permission))
            .map(|acl| acl.target().clone())
            .collect())
    }
}
