use std::sync::Arc;

use custodia_core::{AppError, UserIdentity};
use custodia_domain::{ObjectRef, PermissionId, Role};

use crate::ModelPermissionRegistry;
use crate::test_support::{
    FakeAccessControlListRepository, FakeRelations, FakeRoleRepository, model, object, permission,
};

use super::{
    AccessCheck, AccessControlListService, AclChange, AclCondition, DenialPresentation,
    MAX_INHERITANCE_DEPTH,
};

struct Fixture {
    service: AccessControlListService,
    acls: Arc<FakeAccessControlListRepository>,
    roles: Arc<FakeRoleRepository>,
    relations: Arc<FakeRelations>,
}

fn registry() -> ModelPermissionRegistry {
    let mut builder = ModelPermissionRegistry::builder();
    let documents = builder
        .register_namespace("documents", "Documents")
        .unwrap_or_else(|_| unreachable!());
    let view = builder
        .register_permission(&documents, "document_view", "View documents")
        .unwrap_or_else(|_| unreachable!());
    let edit = builder
        .register_permission(&documents, "document_edit", "Edit documents")
        .unwrap_or_else(|_| unreachable!());
    let cabinets = builder
        .register_namespace("cabinets", "Cabinets")
        .unwrap_or_else(|_| unreachable!());
    let cabinet_view = builder
        .register_permission(&cabinets, "cabinet_view", "View cabinets")
        .unwrap_or_else(|_| unreachable!());
    let tags = builder
        .register_namespace("tags", "Tags")
        .unwrap_or_else(|_| unreachable!());
    let tag_view = builder
        .register_permission(&tags, "tag_view", "View tags")
        .unwrap_or_else(|_| unreachable!());

    let registrations = [
        (model("documents", "document"), vec![view.clone(), edit.clone()], None),
        (model("documents", "documentversion"), vec![view.clone()], Some("document")),
        (model("documents", "documentpage"), vec![view.clone()], Some("document_version")),
        (model("cabinets", "cabinet"), vec![cabinet_view], Some("parent")),
        (model("metadata", "objectmetadata"), vec![view.clone()], Some("content_object")),
        (model("tags", "tag"), vec![tag_view, view], None),
    ];
    for (model_type, permissions, inheritance) in registrations {
        assert!(builder.register(&model_type, &permissions).is_ok());
        if let Some(relation) = inheritance {
            assert!(builder.register_inheritance(&model_type, relation).is_ok());
        }
    }

    builder.build()
}

fn fixture() -> Fixture {
    let acls = Arc::new(FakeAccessControlListRepository::default());
    let roles = Arc::new(FakeRoleRepository::default());
    let relations = Arc::new(FakeRelations::default());
    let service = AccessControlListService::new(
        Arc::new(registry()),
        acls.clone(),
        roles.clone(),
        relations.clone(),
    );

    Fixture {
        service,
        acls,
        roles,
        relations,
    }
}

fn alice() -> UserIdentity {
    UserIdentity::new("alice", "Alice")
}

fn document_view() -> PermissionId {
    permission("documents.document_view")
}

fn cabinet_view() -> PermissionId {
    permission("cabinets.cabinet_view")
}

impl Fixture {
    async fn role_for_alice(&self, global: &[PermissionId]) -> Role {
        self.roles.seed_role_for("Readers", "alice", global).await
    }

    async fn visible(&self, permission: &PermissionId, candidates: &[ObjectRef]) -> Vec<ObjectRef> {
        self.service
            .restrict(permission, candidates.to_vec(), &alice())
            .await
            .unwrap_or_else(|_| unreachable!())
    }
}

#[tokio::test]
async fn grant_then_revoke_removes_access_and_row() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");

    let granted = fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(granted.change, AclChange::Created);
    assert_eq!(
        fixture.visible(&document_view(), &[document.clone()]).await,
        vec![document.clone()]
    );

    let revoked = fixture
        .service
        .revoke(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(revoked.change, AclChange::Deleted);
    assert!(fixture.acls.acls.lock().await.is_empty());
    assert!(fixture.visible(&document_view(), &[document]).await.is_empty());
}

#[tokio::test]
async fn granting_twice_keeps_one_permission() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");

    for _ in 0..2 {
        assert!(
            fixture
                .service
                .grant(&document, &document_view(), role.role_id())
                .await
                .is_ok()
        );
    }

    let acls = fixture.acls.acls.lock().await;
    assert_eq!(acls.len(), 1);
    let acl = acls
        .get(&(document, role.role_id()))
        .unwrap_or_else(|| unreachable!());
    assert_eq!(acl.permissions().len(), 1);
    assert_eq!(*fixture.acls.writes.lock().await, 1);
}

#[tokio::test]
async fn second_grant_on_same_row_is_an_edit() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");

    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    let edit = fixture
        .service
        .grant(
            &document,
            &permission("documents.document_edit"),
            role.role_id(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(edit.change, AclChange::Edited);

    let partial = fixture
        .service
        .revoke(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(partial.change, AclChange::Edited);
    assert_eq!(fixture.acls.acls.lock().await.len(), 1);
}

#[tokio::test]
async fn revoke_without_grant_is_a_no_op() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;

    let result = fixture
        .service
        .revoke(
            &object("documents", "document", "1"),
            &document_view(),
            role.role_id(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(result.change, AclChange::Unchanged);
    assert!(result.acl.is_none());
    assert_eq!(*fixture.acls.writes.lock().await, 0);
}

#[tokio::test]
async fn grant_rejects_permission_not_registered_for_the_type() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;

    let result = fixture
        .service
        .grant(
            &object("documents", "documentversion", "7"),
            &permission("documents.document_edit"),
            role.role_id(),
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::PermissionNotValidForClass { .. })
    ));
    assert!(fixture.acls.acls.lock().await.is_empty());
    assert_eq!(*fixture.acls.writes.lock().await, 0);
}

#[tokio::test]
async fn grant_requires_existing_role() {
    let fixture = fixture();
    let orphan = Role::new("Orphan").unwrap_or_else(|_| unreachable!());

    let result = fixture
        .service
        .grant(
            &object("documents", "document", "1"),
            &document_view(),
            orphan.role_id(),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn global_permission_returns_candidates_unfiltered() {
    let fixture = fixture();
    fixture.role_for_alice(&[document_view()]).await;
    let candidates = vec![
        object("documents", "document", "1"),
        object("documents", "document", "2"),
    ];

    assert_eq!(fixture.visible(&document_view(), &candidates).await, candidates);
}

#[tokio::test]
async fn superuser_sees_everything_without_roles() {
    let fixture = fixture();
    let candidates = vec![object("documents", "document", "1")];

    let visible = fixture
        .service
        .restrict(
            &document_view(),
            candidates.clone(),
            &UserIdentity::new("root", "Root").with_superuser(true),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(visible, candidates);
}

#[tokio::test]
async fn direct_grant_includes_only_granted_object() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let granted = object("documents", "document", "1");
    let other = object("documents", "document", "2");
    fixture
        .service
        .grant(&granted, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture
            .visible(&document_view(), &[other.clone(), granted.clone()])
            .await,
        vec![granted]
    );
}

#[tokio::test]
async fn user_without_roles_sees_nothing() {
    let fixture = fixture();
    let role = fixture
        .roles
        .seed_role_for("Editors", "bob", &[])
        .await;
    let document = object("documents", "document", "1");
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(fixture.visible(&document_view(), &[document]).await.is_empty());
}

#[tokio::test]
async fn parent_grant_propagates_to_child() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let version = object("documents", "documentversion", "10");
    fixture.relations.link(&version, "document", &document).await;
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture.visible(&document_view(), &[version.clone()]).await,
        vec![version]
    );
}

#[tokio::test]
async fn grant_on_grandparent_without_own_inheritance_propagates() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let version = object("documents", "documentversion", "10");
    let page = object("documents", "documentpage", "100");
    fixture.relations.link(&version, "document", &document).await;
    fixture.relations.link(&page, "document_version", &version).await;
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture.visible(&document_view(), &[page.clone()]).await,
        vec![page]
    );
}

#[tokio::test]
async fn deeper_ancestors_must_confirm_their_own_paths() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let root = object("cabinets", "cabinet", "1");
    let child = object("cabinets", "cabinet", "2");
    let grandchild = object("cabinets", "cabinet", "3");
    fixture.relations.link(&child, "parent", &root).await;
    fixture.relations.link(&grandchild, "parent", &child).await;
    fixture
        .service
        .grant(&root, &cabinet_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    // The root cabinet has no parent, so its own path never holds below the
    // first level.
    assert_eq!(
        fixture
            .visible(&cabinet_view(), &[child.clone(), grandchild])
            .await,
        vec![child]
    );
}

#[tokio::test]
async fn generic_relation_resolves_to_any_model_type() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let tag = object("tags", "tag", "5");
    let on_document = object("metadata", "objectmetadata", "20");
    let on_tag = object("metadata", "objectmetadata", "21");
    fixture
        .relations
        .link(&on_document, "content_object", &document)
        .await;
    fixture.relations.link(&on_tag, "content_object", &tag).await;
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture
            .visible(&document_view(), &[on_document.clone(), on_tag])
            .await,
        vec![on_document]
    );
}

#[tokio::test]
async fn type_without_inheritance_ignores_unrelated_grants() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let tag = object("tags", "tag", "5");
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(fixture.visible(&document_view(), &[tag]).await.is_empty());
}

#[tokio::test]
async fn permission_not_registered_for_candidate_type_excludes_it() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let version = object("documents", "documentversion", "10");
    fixture.relations.link(&version, "document", &document).await;
    let edit = permission("documents.document_edit");
    fixture
        .service
        .grant(&document, &edit, role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(fixture.visible(&edit, &[version]).await.is_empty());
}

#[tokio::test]
async fn unregistered_candidate_type_fails_the_call() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    fixture
        .service
        .grant(
            &object("documents", "document", "1"),
            &document_view(),
            role.role_id(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let result = fixture
        .service
        .restrict(
            &document_view(),
            vec![object("ocr", "documentpagecontent", "1")],
            &alice(),
        )
        .await;

    assert!(matches!(result, Err(AppError::UnknownModel(_))));
}

#[tokio::test]
async fn cyclic_relations_do_not_hide_other_candidates() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let first = object("cabinets", "cabinet", "1");
    let second = object("cabinets", "cabinet", "2");
    let granted = object("cabinets", "cabinet", "3");
    fixture.relations.link(&first, "parent", &second).await;
    fixture.relations.link(&second, "parent", &first).await;
    fixture
        .service
        .grant(&granted, &cabinet_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture
            .visible(&cabinet_view(), &[granted.clone(), first.clone()])
            .await,
        vec![granted]
    );

    fixture
        .service
        .grant(&second, &cabinet_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        fixture.visible(&cabinet_view(), &[first.clone()]).await,
        vec![first]
    );
}

#[tokio::test]
async fn chains_past_the_depth_limit_are_cut_without_failing() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let cabinets: Vec<ObjectRef> = (0..MAX_INHERITANCE_DEPTH + 8)
        .map(|index| object("cabinets", "cabinet", index.to_string().as_str()))
        .collect();
    for pair in cabinets.windows(2) {
        fixture.relations.link(&pair[0], "parent", &pair[1]).await;
    }
    fixture
        .service
        .grant(&cabinets[1], &cabinet_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture
            .visible(&cabinet_view(), &[cabinets[0].clone()])
            .await,
        vec![cabinets[0].clone()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_grants_on_one_entry_keep_both_permissions() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let edit = permission("documents.document_edit");
    let view = document_view();

    let (view_grant, edit_grant) = tokio::join!(
        fixture.service.grant(&document, &view, role.role_id()),
        fixture.service.grant(&document, &edit, role.role_id()),
    );
    let changes = [
        view_grant.unwrap_or_else(|_| unreachable!()).change,
        edit_grant.unwrap_or_else(|_| unreachable!()).change,
    ];
    assert_eq!(
        changes
            .iter()
            .filter(|change| **change == AclChange::Created)
            .count(),
        1
    );
    assert!(changes.contains(&AclChange::Edited));

    let acls = fixture.acls.acls.lock().await;
    let stored = acls
        .get(&(document, role.role_id()))
        .unwrap_or_else(|| unreachable!());
    assert!(stored.has_permission(&document_view()));
    assert!(stored.has_permission(&edit));
}

#[tokio::test]
#[allow(deprecated)]
async fn check_access_reports_denial_with_chosen_presentation() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let granted = object("documents", "document", "1");
    let hidden = object("documents", "document", "2");
    fixture
        .service
        .grant(&granted, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    let allowed = fixture
        .service
        .check_access(&granted, &document_view(), &alice())
        .await;
    assert!(matches!(allowed, Ok(AccessCheck::Granted)));

    let denied = fixture
        .service
        .check_access(&hidden, &document_view(), &alice())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!denied.is_granted());
    assert!(matches!(
        denied.clone().require(DenialPresentation::NotFound),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        denied.require(DenialPresentation::Forbidden),
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn explain_lists_granted_ancestors() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let document = object("documents", "document", "1");
    let version = object("documents", "documentversion", "10");
    fixture.relations.link(&version, "document", &document).await;
    fixture
        .service
        .grant(&document, &document_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    let explanation = fixture
        .service
        .explain(&version, &document_view(), &alice())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(explanation.granted);
    assert!(explanation.access_level.is_none());
    assert_eq!(explanation.granted_objects, vec![document.clone()]);
    assert_eq!(
        explanation.condition,
        AclCondition::Any(vec![
            AclCondition::Granted(version),
            AclCondition::Any(vec![AclCondition::Any(vec![AclCondition::Granted(document)])]),
        ])
    );
}

#[tokio::test]
async fn inherited_permissions_collect_ancestors_and_global_grants() {
    let fixture = fixture();
    let role = fixture
        .role_for_alice(&[permission("tags.tag_view")])
        .await;
    let document = object("documents", "document", "1");
    let version = object("documents", "documentversion", "10");
    let page = object("documents", "documentpage", "100");
    fixture.relations.link(&version, "document", &document).await;
    fixture.relations.link(&page, "document_version", &version).await;
    for granted in [document_view(), permission("documents.document_edit")] {
        fixture
            .service
            .grant(&document, &granted, role.role_id())
            .await
            .unwrap_or_else(|_| unreachable!());
    }

    let inherited = fixture
        .service
        .get_inherited_permissions(&page, role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(inherited.into_iter().collect::<Vec<_>>(), vec![document_view()]);

    let on_document = fixture
        .service
        .get_inherited_permissions(&document, role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(on_document.is_empty());
}

#[tokio::test]
async fn inherited_permissions_agree_with_restriction() {
    let fixture = fixture();
    let role = fixture.role_for_alice(&[]).await;
    let root = object("cabinets", "cabinet", "1");
    let child = object("cabinets", "cabinet", "2");
    let grandchild = object("cabinets", "cabinet", "3");
    fixture.relations.link(&child, "parent", &root).await;
    fixture.relations.link(&grandchild, "parent", &child).await;
    fixture
        .service
        .grant(&root, &cabinet_view(), role.role_id())
        .await
        .unwrap_or_else(|_| unreachable!());

    for (cabinet, expected) in [(child, true), (grandchild, false)] {
        let inherited = fixture
            .service
            .get_inherited_permissions(&cabinet, role.role_id())
            .await
            .unwrap_or_else(|_| unreachable!());
        let visible = fixture
            .visible(&cabinet_view(), &[cabinet.clone()])
            .await;

        assert_eq!(inherited.contains(&cabinet_view()), expected);
        assert_eq!(visible == vec![cabinet], expected);
    }
}
