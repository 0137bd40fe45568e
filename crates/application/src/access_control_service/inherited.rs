use std::collections::{BTreeSet, HashSet};

use super::conditions::AclConditionBuilder;
use super::*;

impl AccessControlListService {
    /// Returns the permissions a role holds on an object without an entry on
    /// the object itself.
    ///
    /// A permission counts when the role's entries on the target's ancestors
    /// satisfy the same inheritance condition `restrict` evaluates, or when
    /// the role grants it globally. Only permissions registered for the
    /// target's model type are reported.
    pub async fn get_inherited_permissions(
        &self,
        target: &ObjectRef,
        role_id: RoleId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        self.ensure_registered(target)?;
        let role = self.require_role(role_id).await?;

        let condition = AclConditionBuilder::new(&self.registry, self.resolver.as_ref())
            .build(target)
            .await?;

        let mut seen = HashSet::from([target]);
        let mut ancestor_entries = Vec::new();
        for object in condition.referenced_objects() {
            if !seen.insert(object) {
                continue;
            }
            if let Some(acl) = self.acl_repository.find_acl(object, role_id).await? {
                ancestor_entries.push(acl);
            }
        }

        Ok(self
            .registry
            .get_for_class(target.model())
            .into_iter()
            .filter(|permission| {
                if role.has_permission(permission) {
                    return true;
                }

                let granted: HashSet<ObjectRef> = ancestor_entries
                    .iter()
                    .filter(|acl| acl.has_permission(permission))
                    .map(|acl| acl.target().clone())
                    .collect();
                !granted.is_empty() && condition.evaluate(&granted)
            })
            .collect())
    }
}
