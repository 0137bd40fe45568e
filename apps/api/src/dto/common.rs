use std::str::FromStr;

use custodia_core::AppResult;
use custodia_domain::{ModelType, ObjectRef};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Object reference as exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRefDto {
    pub content_type: String,
    pub object_id: String,
}

impl ObjectRefDto {
    /// Parses the transport form into a validated reference.
    pub fn into_object_ref(self) -> AppResult<ObjectRef> {
        ObjectRef::new(ModelType::from_str(&self.content_type)?, self.object_id)
    }
}

impl From<&ObjectRef> for ObjectRefDto {
    fn from(value: &ObjectRef) -> Self {
        Self {
            content_type: value.model().storage_value(),
            object_id: value.object_id().to_owned(),
        }
    }
}
