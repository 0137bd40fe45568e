use axum::Json;
use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use custodia_core::UserIdentity;
use custodia_domain::RoleId;

use super::{object_from_path, parse_permission};
use crate::dto::{AclChangeRequest, AclMutationResponse, AclResponse, InheritedPermissionsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_acls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<AclResponse>>> {
    let target = object_from_path(content_type, object_id)?;
    let acls = state
        .acl_admin_service
        .list_acls(&user, &target)
        .await?
        .into_iter()
        .map(AclResponse::from)
        .collect();

    Ok(Json(acls))
}

pub async fn grant_acl_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id)): Path<(String, String)>,
    Json(payload): Json<AclChangeRequest>,
) -> ApiResult<Json<AclMutationResponse>> {
    let target = object_from_path(content_type, object_id)?;
    let permission = parse_permission(payload.permission.as_str())?;
    let mutation = state
        .acl_admin_service
        .grant(&user, &target, &permission, RoleId::from_uuid(payload.role_id))
        .await?;

    Ok(Json(AclMutationResponse::from(mutation)))
}

pub async fn revoke_acl_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id)): Path<(String, String)>,
    Json(payload): Json<AclChangeRequest>,
) -> ApiResult<Json<AclMutationResponse>> {
    let target = object_from_path(content_type, object_id)?;
    let permission = parse_permission(payload.permission.as_str())?;
    let mutation = state
        .acl_admin_service
        .revoke(&user, &target, &permission, RoleId::from_uuid(payload.role_id))
        .await?;

    Ok(Json(AclMutationResponse::from(mutation)))
}

pub async fn inherited_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id, role_id)): Path<(String, String, Uuid)>,
) -> ApiResult<Json<InheritedPermissionsResponse>> {
    let target = object_from_path(content_type, object_id)?;
    let role_id = RoleId::from_uuid(role_id);
    let permissions = state
        .acl_admin_service
        .inherited_permissions(&user, &target, role_id)
        .await?;

    Ok(Json(InheritedPermissionsResponse::new(role_id, permissions)))
}
