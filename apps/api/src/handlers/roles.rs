use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use custodia_core::UserIdentity;
use custodia_domain::RoleId;

use super::parse_permission;
use crate::dto::{
    CreateRoleRequest, GroupMemberRequest, RoleGroupRequest, RolePermissionRequest, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_service
        .create_role(&user, payload.label.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .get_role(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .delete_role(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<RolePermissionRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permission = parse_permission(payload.permission.as_str())?;
    let role = state
        .role_service
        .grant_permission(&user, RoleId::from_uuid(role_id), &permission)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn revoke_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((role_id, permission)): Path<(Uuid, String)>,
) -> ApiResult<Json<RoleResponse>> {
    let permission = parse_permission(permission.as_str())?;
    let role = state
        .role_service
        .revoke_permission(&user, RoleId::from_uuid(role_id), &permission)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn add_role_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<RoleGroupRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .add_group(&user, RoleId::from_uuid(role_id), payload.group.as_str())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn remove_role_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((role_id, group)): Path<(Uuid, String)>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .remove_group(&user, RoleId::from_uuid(role_id), group.as_str())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn list_group_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let members = state
        .role_service
        .list_group_members(&user, group.as_str())
        .await?;

    Ok(Json(members))
}

pub async fn add_group_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group): Path<String>,
    Json(payload): Json<GroupMemberRequest>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .add_group_member(&user, group.as_str(), payload.subject.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_group_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((group, subject)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .remove_group_member(&user, group.as_str(), subject.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
