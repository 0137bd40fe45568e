use axum::Json;
use axum::extract::{Extension, State};

use custodia_core::{AppResult, UserIdentity};
use custodia_domain::PermissionId;

use super::parse_permission;
use crate::dto::{ExplainRequest, ExplainResponse, ObjectRefDto, RestrictRequest, RestrictResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn restrict_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RestrictRequest>,
) -> ApiResult<Json<RestrictResponse>> {
    let permission = declared_permission(&state, payload.permission.as_str())?;
    let candidates = payload
        .objects
        .into_iter()
        .map(ObjectRefDto::into_object_ref)
        .collect::<AppResult<Vec<_>>>()?;

    let objects = state
        .acl_service
        .restrict(&permission, candidates, &user)
        .await?
        .iter()
        .map(ObjectRefDto::from)
        .collect();

    Ok(Json(RestrictResponse { objects }))
}

pub async fn explain_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ExplainRequest>,
) -> ApiResult<Json<ExplainResponse>> {
    let permission = declared_permission(&state, payload.permission.as_str())?;
    let target = payload.target.into_object_ref()?;

    let explanation = state
        .acl_service
        .explain(&target, &permission, &user)
        .await?;

    Ok(Json(ExplainResponse::from(explanation)))
}

fn declared_permission(state: &AppState, value: &str) -> AppResult<PermissionId> {
    let permission = parse_permission(value)?;
    state.acl_service.registry().validate_permission(&permission)?;
    Ok(permission)
}
