use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use clinic_core::{AppError, Role};
use clinic_domain::AccessPolicy;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{gate_router, gated};
use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;


pub fn build_router<Store>(
    app_state: AppState,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let authorization_service = app_state.authorization_service.clone();

    let admin_routes = gate_router(
        Router::new()
            .route(
                "/admin/permissions",
                get(handlers::permissions::list_permissions_handler)
                    .post(handlers::permissions::create_permission_handler),
            )
            .route(
                "/admin/permissions/{permission_id}",
                delete(handlers::permissions::delete_permission_handler),
            )
            .route(
                "/admin/permissions/role/{role}",
                get(handlers::permissions::list_role_grants_handler),
            )
            .route(
                "/admin/permissions/role/{role}/grant",
                post(handlers::permissions::grant_permission_handler),
            )
            .route(
                "/admin/permissions/role/{role}/revoke",
                post(handlers::permissions::revoke_permission_handler),
            ),
        &authorization_service,
        AccessPolicy::authenticated().with_roles([Role::Admin]),
    );

    let member_routes = Router::new()
        .route(
            "/auth/me",
            gated(
                get(auth::me_handler),
                &authorization_service,
                AccessPolicy::authenticated(),
            ),
        )
        .route(
            "/auth/permissions",
            gated(
                get(auth::my_permissions_handler),
                &authorization_service,
                AccessPolicy::authenticated(),
            ),
        );

    let cors_layer = cors::build_cors_layer(&app_state.frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(member_routes)
        .merge(admin_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(from_fn(middleware::attach_session_identity))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
