pub mod access;
pub mod acls;
pub mod audit;
pub mod catalogue;
pub mod health;
pub mod relations;
pub mod roles;


use custodia_core::AppResult;
use custodia_domain::{ObjectRef, PermissionId};

use crate::dto::ObjectRefDto;

fn object_from_path(content_type: String, object_id: String) -> AppResult<ObjectRef> {
    ObjectRefDto {
        content_type,
        object_id,
    }
    .into_object_ref()
}

fn parse_permission(value: &str) -> AppResult<PermissionId> {
    PermissionId::from_transport(value)
}
