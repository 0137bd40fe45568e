use std::collections::BTreeSet;

use custodia_application::{AccessExplanation, AclChange, AclCondition, AclMutation};
use custodia_domain::{AccessControlList, PermissionId, RoleId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ObjectRefDto;

/// Incoming payload for granting or revoking an object permission.
#[derive(Debug, Deserialize)]
pub struct AclChangeRequest {
    pub permission: String,
    pub role_id: Uuid,
}

/// API representation of an access control entry.
#[derive(Debug, Serialize)]
pub struct AclResponse {
    pub acl_id: String,
    pub target: ObjectRefDto,
    pub role_id: String,
    pub permissions: Vec<String>,
}

/// Outcome of a grant or revoke.
#[derive(Debug, Serialize)]
pub struct AclMutationResponse {
    pub change: &'static str,
    pub acl: Option<AclResponse>,
}

/// Permissions a role holds on an object through inheritance.
#[derive(Debug, Serialize)]
pub struct InheritedPermissionsResponse {
    pub role_id: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for filtering a candidate set.
#[derive(Debug, Deserialize)]
pub struct RestrictRequest {
    pub permission: String,
    pub objects: Vec<ObjectRefDto>,
}

/// Candidates the caller may access, in request order.
#[derive(Debug, Serialize)]
pub struct RestrictResponse {
    pub objects: Vec<ObjectRefDto>,
}

/// Incoming payload for explaining one access decision.
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub permission: String,
    pub target: ObjectRefDto,
}

/// Inheritance condition tree.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionResponse {
    Granted { object: ObjectRefDto },
    Unreachable,
    Any { branches: Vec<ConditionResponse> },
    All { branches: Vec<ConditionResponse> },
}

/// API representation of an access decision.
#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub granted: bool,
    pub access_level: Option<&'static str>,
    pub granted_objects: Vec<ObjectRefDto>,
    pub condition: ConditionResponse,
}

impl From<AccessControlList> for AclResponse {
    fn from(value: AccessControlList) -> Self {
        Self {
            acl_id: value.acl_id().to_string(),
            target: ObjectRefDto::from(value.target()),
            role_id: value.role_id().to_string(),
            permissions: value
                .permissions()
                .iter()
                .map(PermissionId::storage_value)
                .collect(),
        }
    }
}

impl From<AclMutation> for AclMutationResponse {
    fn from(value: AclMutation) -> Self {
        let change = match value.change {
            AclChange::Created => "created",
            AclChange::Edited => "edited",
            AclChange::Deleted => "deleted",
            AclChange::Unchanged => "unchanged",
        };

        Self {
            change,
            acl: value.acl.map(AclResponse::from),
        }
    }
}

impl InheritedPermissionsResponse {
    pub fn new(role_id: RoleId, permissions: BTreeSet<PermissionId>) -> Self {
        Self {
            role_id: role_id.to_string(),
            permissions: permissions
                .iter()
                .map(PermissionId::storage_value)
                .collect(),
        }
    }
}

impl From<&AclCondition> for ConditionResponse {
    fn from(value: &AclCondition) -> Self {
        match value {
            AclCondition::Granted(object) => Self::Granted {
                object: ObjectRefDto::from(object),
            },
            AclCondition::Unreachable => Self::Unreachable,
            AclCondition::Any(branches) => Self::Any {
                branches: branches.iter().map(Self::from).collect(),
            },
            AclCondition::All(branches) => Self::All {
                branches: branches.iter().map(Self::from).collect(),
            },
        }
    }
}

impl From<AccessExplanation> for ExplainResponse {
    fn from(value: AccessExplanation) -> Self {
        Self {
            granted: value.granted,
            access_level: value.access_level.map(|level| level.as_str()),
            granted_objects: value
                .granted_objects
                .iter()
                .map(ObjectRefDto::from)
                .collect(),
            condition: ConditionResponse::from(&value.condition),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConditionResponse, ObjectRefDto};

    #[test]
    fn conditions_serialize_with_kind_tag() {
        let condition = ConditionResponse::Any {
            branches: vec![
                ConditionResponse::Granted {
                    object: ObjectRefDto {
                        content_type: "cabinets.cabinet".to_owned(),
                        object_id: "4".to_owned(),
                    },
                },
                ConditionResponse::All {
                    branches: vec![ConditionResponse::Unreachable],
                },
            ],
        };

        let value = serde_json::to_value(&condition).unwrap_or_else(|_| unreachable!());
        assert_eq!(
            value,
            json!({
                "kind": "any",
                "branches": [
                    {
                        "kind": "granted",
                        "object": { "content_type": "cabinets.cabinet", "object_id": "4" }
                    },
                    { "kind": "all", "branches": [{ "kind": "unreachable" }] }
                ]
            })
        );
    }
}
