use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use serde::Deserialize;

use custodia_application::AuditLogQuery;
use custodia_core::UserIdentity;
use custodia_domain::AuditAction;

use crate::dto::AuditLogEntryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub subject: Option<String>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let action = params
        .action
        .as_deref()
        .map(AuditAction::from_str)
        .transpose()?;

    let entries = state
        .role_service
        .list_audit_entries(
            &user,
            AuditLogQuery {
                limit: params.limit.unwrap_or(50),
                offset: params.offset.unwrap_or(0),
                action,
                subject: params.subject,
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
