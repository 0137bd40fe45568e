use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use custodia_core::{AppError, UserIdentity};

use crate::api_config::IdentityConfig;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the request identity from the subject header set by the
/// authenticating proxy.
pub async fn require_subject(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let subject = request
        .headers()
        .get(state.identity.subject_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?
        .to_owned();

    let identity = identity_for(&state.identity, subject);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub fn identity_for(config: &IdentityConfig, subject: String) -> UserIdentity {
    let is_superuser = config.superuser_subjects.contains(&subject);
    let is_staff = config.staff_subjects.contains(&subject);

    UserIdentity::new(subject.clone(), subject)
        .with_superuser(is_superuser)
        .with_staff(is_staff)
}
