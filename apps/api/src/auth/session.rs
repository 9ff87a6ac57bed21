use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use clinic_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{PermissionKeysResponse, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    Ok(Json(UserIdentityResponse::from(user)))
}

/// Lists the permission keys the caller's role can exercise.
///
/// Drives client affordances only; every protected route re-checks.
pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<PermissionKeysResponse>> {
    let permissions = state
        .authorization_service
        .caller_permission_keys(user.role())
        .await?;

    Ok(Json(PermissionKeysResponse {
        role: user.role().as_str().to_owned(),
        permissions,
    }))
}
