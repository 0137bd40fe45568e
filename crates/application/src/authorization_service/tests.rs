use std::sync::Arc;

use custodia_core::{AppError, UserIdentity};
use custodia_domain::AccessLevel;

use crate::test_support::{FakeRoleRepository, permission};

use super::AuthorizationService;

#[tokio::test]
async fn access_level_reports_role_grant() {
    let repository = Arc::new(FakeRoleRepository::default());
    repository
        .seed_role_for("Readers", "alice", &[permission("documents.document_view")])
        .await;
    let service = AuthorizationService::new(repository);

    let level = service
        .access_level(
            &UserIdentity::new("alice", "Alice"),
            &permission("documents.document_view"),
        )
        .await;
    assert!(matches!(level, Ok(Some(AccessLevel::RoleGrant))));
}

#[tokio::test]
async fn superuser_and_staff_bypass_role_lookup() {
    let service = AuthorizationService::new(Arc::new(FakeRoleRepository::default()));
    let view = permission("documents.document_view");

    let superuser = UserIdentity::new("root", "Root").with_superuser(true);
    let staff = UserIdentity::new("ops", "Ops").with_staff(true);

    assert!(matches!(
        service.access_level(&superuser, &view).await,
        Ok(Some(AccessLevel::SuperuserOverride))
    ));
    assert!(matches!(
        service.access_level(&staff, &view).await,
        Ok(Some(AccessLevel::StaffOverride))
    ));
}

#[tokio::test]
async fn check_user_permissions_accepts_any_listed_permission() {
    let repository = Arc::new(FakeRoleRepository::default());
    repository
        .seed_role_for("Taggers", "bob", &[permission("tags.tag_attach")])
        .await;
    let service = AuthorizationService::new(repository);

    let result = service
        .check_user_permissions(
            &UserIdentity::new("bob", "Bob"),
            &[permission("tags.tag_create"), permission("tags.tag_attach")],
        )
        .await;
    assert!(matches!(result, Ok(AccessLevel::RoleGrant)));
}

#[tokio::test]
async fn require_permission_denies_missing_grant() {
    let repository = Arc::new(FakeRoleRepository::default());
    repository
        .seed_role_for("Readers", "alice", &[permission("documents.document_view")])
        .await;
    let service = AuthorizationService::new(repository);

    let result = service
        .require_permission(
            &UserIdentity::new("alice", "Alice"),
            &permission("documents.document_delete"),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn roles_of_other_subjects_do_not_apply() {
    let repository = Arc::new(FakeRoleRepository::default());
    repository
        .seed_role_for("Readers", "alice", &[permission("documents.document_view")])
        .await;
    let service = AuthorizationService::new(repository);

    let granted = service
        .has_permission(
            &UserIdentity::new("mallory", "Mallory"),
            &permission("documents.document_view"),
        )
        .await;
    assert!(matches!(granted, Ok(false)));
}
