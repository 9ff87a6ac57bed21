use std::sync::Arc;

use clinic_application::AuthorizationService;
use clinic_core::AppError;
use clinic_infrastructure::{PostgresPermissionRepository, PostgresRoleGrantRepository};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let authorization_service = AuthorizationService::new(
        Arc::new(PostgresPermissionRepository::new(pool.clone())),
        Arc::new(PostgresRoleGrantRepository::new(pool.clone())),
    );

    if config.seed_default_permissions {
        let seeded = authorization_service.ensure_default_catalog().await?;
        info!(count = seeded.len(), "default permission catalog ensured");
    }

    Ok(AppState {
        authorization_service,
        postgres_pool: Some(pool),
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
