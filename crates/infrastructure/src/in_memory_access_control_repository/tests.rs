use std::sync::Arc;

use custodia_application::{AccessControlListRepository, AclChange, RoleRepository};
use custodia_core::AppError;
use custodia_domain::{ModelType, ObjectRef, PermissionId, Role, RoleId};

use super::InMemoryAccessControlRepository;

fn document(object_id: &str) -> ObjectRef {
    let model = ModelType::new("documents", "document").unwrap_or_else(|_| unreachable!());
    ObjectRef::new(model, object_id).unwrap_or_else(|_| unreachable!())
}

fn permission(value: &str) -> PermissionId {
    value.parse().unwrap_or_else(|_| unreachable!())
}

async fn seeded_role(repository: &InMemoryAccessControlRepository, label: &str) -> Role {
    let role = Role::new(label).unwrap_or_else(|_| unreachable!());
    repository
        .create_role(role)
        .await
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn role_labels_are_unique() {
    let repository = InMemoryAccessControlRepository::new();
    seeded_role(&repository, "Readers").await;

    let duplicate = repository
        .create_role(Role::new("Readers").unwrap_or_else(|_| unreachable!()))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn subject_roles_follow_group_membership() {
    let repository = InMemoryAccessControlRepository::new();
    let role = seeded_role(&repository, "Readers").await;
    assert!(matches!(
        repository.add_role_group(role.role_id(), "readers").await,
        Ok(true)
    ));
    assert!(matches!(
        repository.add_role_group(role.role_id(), "readers").await,
        Ok(false)
    ));

    assert!(repository.add_group_member("readers", "alice").await.is_ok());
    let roles = repository.list_roles_for_subject("alice").await;
    assert!(matches!(roles.as_deref(), Ok([stored]) if stored.role_id() == role.role_id()));

    assert!(repository.remove_group_member("readers", "alice").await.is_ok());
    assert!(matches!(
        repository.list_roles_for_subject("alice").await,
        Ok(roles) if roles.is_empty()
    ));
    assert!(matches!(
        repository.list_group_members("readers").await,
        Ok(members) if members.is_empty()
    ));
}

#[tokio::test]
async fn role_edits_need_an_existing_role() {
    let repository = InMemoryAccessControlRepository::new();

    let result = repository
        .add_role_permission(RoleId::new(), &permission("documents.document_view"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn last_revoke_drops_the_entry() {
    let repository = InMemoryAccessControlRepository::new();
    let role = seeded_role(&repository, "Readers").await;
    let target = document("1");
    let view = permission("documents.document_view");

    let created = repository
        .add_permission(&target, role.role_id(), &view)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.change, AclChange::Created);
    assert!(matches!(
        repository.list_granted_objects(&[role.role_id()], &view).await,
        Ok(objects) if objects.contains(&target)
    ));

    let deleted = repository
        .remove_permission(&target, role.role_id(), &view)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(deleted.change, AclChange::Deleted);
    assert!(matches!(
        repository.find_acl(&target, role.role_id()).await,
        Ok(None)
    ));

    let again = repository
        .remove_permission(&target, role.role_id(), &view)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(again.change, AclChange::Unchanged);
    assert!(again.acl.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_grants_on_one_entry_all_survive() {
    let repository = Arc::new(InMemoryAccessControlRepository::new());
    let role_id = seeded_role(&repository, "Readers").await.role_id();
    let target = document("1");
    let permissions: Vec<PermissionId> = ["view", "edit", "delete", "print", "download"]
        .iter()
        .map(|name| permission(format!("documents.document_{name}").as_str()))
        .collect();

    let tasks: Vec<_> = permissions
        .iter()
        .cloned()
        .map(|permission| {
            let repository = repository.clone();
            let target = target.clone();
            tokio::spawn(async move {
                repository
                    .add_permission(&target, role_id, &permission)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        let mutation = task
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|_| unreachable!());
        if mutation.change == AclChange::Created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let stored = repository
        .find_acl(&target, role_id)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.permissions().len(), permissions.len());
}

#[tokio::test]
async fn deleting_a_role_drops_its_entries() {
    let repository = InMemoryAccessControlRepository::new();
    let role = seeded_role(&repository, "Readers").await;
    let other = seeded_role(&repository, "Editors").await;

    for (object_id, role_id) in [("1", role.role_id()), ("2", other.role_id())] {
        assert!(
            repository
                .add_permission(
                    &document(object_id),
                    role_id,
                    &permission("documents.document_view")
                )
                .await
                .is_ok()
        );
    }

    assert!(repository.delete_role(role.role_id()).await.is_ok());
    assert!(matches!(
        repository.list_acls_for_object(&document("1")).await,
        Ok(acls) if acls.is_empty()
    ));
    assert!(matches!(
        repository.list_acls_for_object(&document("2")).await,
        Ok(acls) if acls.len() == 1
    ));
}
