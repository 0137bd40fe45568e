use std::fmt::{Display, Formatter};
use std::str::FromStr;

use custodia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Content type of a persisted object: owning application plus model name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelType {
    app_label: String,
    model: String,
}

impl ModelType {
    /// Creates a validated, lower-cased model type.
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            app_label: normalize_segment("app label", app_label.into())?,
            model: normalize_segment("model name", model.into())?,
        })
    }

    /// Returns the owning application label.
    #[must_use]
    pub fn app_label(&self) -> &str {
        self.app_label.as_str()
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    /// Returns the `app_label.model` storage value.
    #[must_use]
    pub fn storage_value(&self) -> String {
        format!("{}.{}", self.app_label, self.model)
    }
}

impl FromStr for ModelType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((app_label, model)) = value.split_once('.') else {
            return Err(AppError::Validation(format!(
                "model type '{value}' must have the form 'app_label.model'"
            )));
        };

        Self::new(app_label, model)
    }
}

impl TryFrom<String> for ModelType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<ModelType> for String {
    fn from(value: ModelType) -> Self {
        value.storage_value()
    }
}

impl Display for ModelType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.app_label, self.model)
    }
}

/// Reference to one persisted object by content type and primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    model: ModelType,
    object_id: String,
}

impl ObjectRef {
    /// Creates an object reference.
    pub fn new(model: ModelType, object_id: impl Into<String>) -> AppResult<Self> {
        let object_id = object_id.into();
        if object_id.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "object id for '{model}' must not be empty"
            )));
        }

        Ok(Self { model, object_id })
    }

    /// Returns the content type of the referenced object.
    #[must_use]
    pub fn model(&self) -> &ModelType {
        &self.model
    }

    /// Returns the referenced primary key.
    #[must_use]
    pub fn object_id(&self) -> &str {
        self.object_id.as_str()
    }
}

impl Display for ObjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.model, self.object_id)
    }
}

/// Anything that can be checked against access control lists.
pub trait AccessControlled {
    /// Returns the reference used as ACL target.
    fn object_ref(&self) -> ObjectRef;
}

impl AccessControlled for ObjectRef {
    fn object_ref(&self) -> ObjectRef {
        self.clone()
    }
}

fn normalize_segment(kind: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{kind} must not be empty")));
    }

    if !trimmed
        .chars()
        .all(|character| character.is_ascii_alphanumeric() || character == '_')
    {
        return Err(AppError::Validation(format!(
            "{kind} '{trimmed}' may only contain letters, digits and underscores"
        )));
    }

    Ok(trimmed.to_ascii_lowercase())
}
