use std::fmt::{Display, Formatter};
use std::str::FromStr;

use custodia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Attribute traversal from an object to the parent whose entries also apply.
///
/// A path holds one or more relation names separated by dots in its storage
/// form, e.g. `workflow` or `document_version.document`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelationPath(Vec<String>);

impl RelationPath {
    /// Parses and validates a dotted relation path.
    pub fn parse(value: &str) -> AppResult<Self> {
        let hops = value
            .split('.')
            .map(|hop| {
                let hop = hop.trim();
                if hop.is_empty()
                    || !hop
                        .chars()
                        .all(|character| character.is_ascii_alphanumeric() || character == '_')
                {
                    return Err(AppError::Validation(format!(
                        "relation path '{value}' contains an invalid segment '{hop}'"
                    )));
                }

                Ok(hop.to_owned())
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self(hops))
    }

    /// Returns the relation names in traversal order.
    #[must_use]
    pub fn hops(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl FromStr for RelationPath {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RelationPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<RelationPath> for String {
    fn from(value: RelationPath) -> Self {
        value.to_string()
    }
}

impl Display for RelationPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.join(".").as_str())
    }
}
