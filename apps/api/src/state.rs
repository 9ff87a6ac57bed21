use clinic_application::AuthorizationService;
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub postgres_pool: Option<PgPool>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
