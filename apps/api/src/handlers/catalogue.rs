use axum::Json;
use axum::extract::State;

use custodia_domain::PermissionId;

use crate::dto::{ModelResponse, PermissionResponse};
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
) -> Json<Vec<PermissionResponse>> {
    let permissions = state
        .acl_service
        .registry()
        .all_permissions()
        .map(|permission| PermissionResponse {
            permission: permission.id().storage_value(),
            namespace: permission.id().namespace().to_owned(),
            label: permission.label().to_owned(),
        })
        .collect();

    Json(permissions)
}

pub async fn list_models_handler(State(state): State<AppState>) -> Json<Vec<ModelResponse>> {
    let registry = state.acl_service.registry();
    let models = registry
        .get_classes()
        .into_iter()
        .map(|model| ModelResponse {
            permissions: registry
                .get_for_class(&model)
                .iter()
                .map(PermissionId::storage_value)
                .collect(),
            inherits_through: registry
                .get_inheritances(&model)
                .map(|paths| paths.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
            model: model.storage_value(),
        })
        .collect();

    Json(models)
}
