use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use clinic_core::{AppError, Role, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Stores a development identity in the session.
///
/// Stands in for the external authentication provider: whoever knows the
/// bootstrap token may act as any subject and role.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let subject = payload.subject.trim().to_owned();
    if subject.is_empty() {
        return Err(AppError::Validation("subject is required".to_owned()).into());
    }
    let role = Role::from_transport(payload.role.as_str())?;
    let display_name = payload
        .display_name
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| subject.clone());

    let identity = UserIdentity::new(subject, display_name, None, role);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(
        subject = identity.subject(),
        role = identity.role().as_str(),
        "bootstrap identity stored in session"
    );

    Ok(StatusCode::NO_CONTENT)
}
