use serde::Serialize;

/// API representation of a declared permission.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub permission: String,
    pub namespace: String,
    pub label: String,
}

/// API representation of an access controlled model.
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub model: String,
    pub permissions: Vec<String>,
    pub inherits_through: Vec<String>,
}
