use std::collections::BTreeSet;
use std::str::FromStr;

use custodia_core::{AppError, AppResult};
use custodia_domain::{ModelType, ObjectRef, PermissionId};

pub(crate) fn decode_object_ref(content_type: &str, object_id: &str) -> AppResult<ObjectRef> {
    let model = ModelType::from_str(content_type).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode content type '{content_type}': {error}"
        ))
    })?;

    ObjectRef::new(model, object_id).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode object '{content_type}:{object_id}': {error}"
        ))
    })
}

pub(crate) fn decode_permissions<I>(values: I) -> AppResult<BTreeSet<PermissionId>>
where
    I: IntoIterator<Item = String>,
{
    values
        .into_iter()
        .map(|value| {
            PermissionId::from_str(value.as_str()).map_err(|error| {
                AppError::Internal(format!("failed to decode permission '{value}': {error}"))
            })
        })
        .collect()
}
