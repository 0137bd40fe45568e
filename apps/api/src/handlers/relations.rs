use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use tracing::info;

use custodia_application::access_control_catalogue::acl_edit;
use custodia_core::{AppError, AppResult, UserIdentity};
use custodia_domain::{ObjectRef, RelationPath};

use super::object_from_path;
use crate::dto::ObjectRefDto;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn set_relation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id, relation)): Path<(String, String, String)>,
    Json(payload): Json<ObjectRefDto>,
) -> ApiResult<StatusCode> {
    let child = object_from_path(content_type, object_id)?;
    let parent = payload.into_object_ref()?;
    require_relation_edit(&state, &user, &[&child, &parent], relation.as_str()).await?;

    state
        .relation_repository
        .set_relation(&child, relation.as_str(), &parent)
        .await?;
    info!(child = %child, relation = relation.as_str(), parent = %parent, "set object relation");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_relation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((content_type, object_id, relation)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let child = object_from_path(content_type, object_id)?;
    require_relation_edit(&state, &user, &[&child], relation.as_str()).await?;

    state
        .relation_repository
        .clear_relation(&child, relation.as_str())
        .await?;
    info!(child = %child, relation = relation.as_str(), "cleared object relation");

    Ok(StatusCode::NO_CONTENT)
}

/// Relations feed every inheritance decision, so writing them needs the
/// global entry administration permission.
async fn require_relation_edit(
    state: &AppState,
    user: &UserIdentity,
    objects: &[&ObjectRef],
    relation: &str,
) -> AppResult<()> {
    if RelationPath::parse(relation)?.hops().len() != 1 {
        return Err(AppError::Validation(format!(
            "relation '{relation}' must name a single hop"
        )));
    }

    let registry = state.acl_service.registry();
    if let Some(unknown) = objects
        .iter()
        .find(|object| !registry.is_registered(object.model()))
    {
        return Err(AppError::UnknownModel(unknown.model().to_string()));
    }

    state
        .authorization_service
        .require_permission(user, &acl_edit()?)
        .await
}
