use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use clinic_application::CreatePermissionInput;
use clinic_core::{Role, UserIdentity};
use clinic_domain::PermissionId;
use tracing::info;

use crate::dto::{
    CreatePermissionRequest, PermissionGrantRequest, PermissionResponse, RoleGrantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .authorization_service
        .list_permissions()
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .authorization_service
        .create_permission(CreatePermissionInput {
            key: payload.key,
            name: payload.name,
        })
        .await?;

    info!(
        actor = user.subject(),
        key = permission.key().as_str(),
        permission_id = permission.id().as_i64(),
        "permission created"
    );

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let removed = state
        .authorization_service
        .delete_permission(PermissionId::new(permission_id))
        .await?;

    match removed {
        Some(permission) => info!(
            actor = user.subject(),
            permission_id,
            key = permission.key().as_str(),
            "permission deleted"
        ),
        None => info!(
            actor = user.subject(),
            permission_id,
            "permission delete found nothing to remove"
        ),
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_grants_handler(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let role = Role::from_transport(role.as_str())?;

    let grants = state
        .authorization_service
        .list_grants_for_role(role)
        .await?
        .into_iter()
        .map(RoleGrantResponse::from)
        .collect();

    Ok(Json(grants))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
    Json(payload): Json<PermissionGrantRequest>,
) -> ApiResult<StatusCode> {
    let role = Role::from_transport(role.as_str())?;

    state
        .authorization_service
        .grant(role, PermissionId::new(payload.permission_id))
        .await?;

    info!(
        actor = user.subject(),
        role = role.as_str(),
        permission_id = payload.permission_id,
        "permission granted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
    Json(payload): Json<PermissionGrantRequest>,
) -> ApiResult<StatusCode> {
    let role = Role::from_transport(role.as_str())?;

    let removed = state
        .authorization_service
        .revoke(role, PermissionId::new(payload.permission_id))
        .await?;

    info!(
        actor = user.subject(),
        role = role.as_str(),
        permission_id = payload.permission_id,
        removed,
        "permission revoke requested"
    );

    Ok(StatusCode::NO_CONTENT)
}
