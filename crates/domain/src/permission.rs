//! Permission catalogue types.
//!
//! Permissions are declared once at startup by each application module and
//! never change afterwards. They are grouped by namespace and stored by their
//! `namespace.name` value.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use custodia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Group of permissions declared by one application module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionNamespace {
    name: String,
    label: String,
}

impl PermissionNamespace {
    /// Creates a validated namespace.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> AppResult<Self> {
        let name = validate_segment("permission namespace", name.into())?;
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "permission namespace '{name}' requires a label"
            )));
        }

        Ok(Self { name, label })
    }

    /// Returns the stable namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

/// Stable identifier of a permission: namespace plus name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionId {
    namespace: String,
    name: String,
}

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            namespace: validate_segment("permission namespace", namespace.into())?,
            name: validate_segment("permission name", name.into())?,
        })
    }

    /// Returns the namespace segment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    /// Returns the name segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the `namespace.name` storage value.
    #[must_use]
    pub fn storage_value(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Parses a transport value into a permission identifier.
    pub fn from_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }
}

impl FromStr for PermissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((namespace, name)) = value.split_once('.') else {
            return Err(AppError::Validation(format!(
                "permission value '{value}' must have the form 'namespace.name'"
            )));
        };

        Self::new(namespace, name)
    }
}

impl TryFrom<String> for PermissionId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<PermissionId> for String {
    fn from(value: PermissionId) -> Self {
        value.storage_value()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.namespace, self.name)
    }
}

/// A capability checked before an operation is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    label: String,
}

impl Permission {
    /// Creates a permission inside a namespace.
    pub fn new(
        namespace: &PermissionNamespace,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> AppResult<Self> {
        let id = PermissionId::new(namespace.name(), name)?;
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "permission '{id}' requires a label"
            )));
        }

        Ok(Self { id, label })
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> &PermissionId {
        &self.id
    }

    /// Returns the human readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

fn validate_segment(kind: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{kind} must not be empty")));
    }

    if trimmed.contains('.') || trimmed.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "{kind} '{trimmed}' must not contain dots or whitespace"
        )));
    }

    Ok(trimmed.to_owned())
}
