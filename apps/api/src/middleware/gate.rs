//! Per-request enforcement of route access policies.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::MethodRouter;
use clinic_application::{AuthorizationService, RequestPermissionMemo, decision_into_result};
use clinic_core::UserIdentity;
use clinic_domain::{AccessDecision, AccessPolicy};
use tracing::info;

use crate::error::ApiResult;

#[derive(Clone)]
struct GateState {
    authorization_service: AuthorizationService,
    policy: Arc<AccessPolicy>,
}

/// Guards a single route with `policy`.
pub fn gated<S>(
    route: MethodRouter<S>,
    authorization_service: &AuthorizationService,
    policy: AccessPolicy,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(from_fn_with_state(
        GateState {
            authorization_service: authorization_service.clone(),
            policy: Arc::new(policy),
        },
        enforce_access,
    ))
}

/// Guards every route registered on `router` so far with `policy`.
pub fn gate_router<S>(
    router: Router<S>,
    authorization_service: &AuthorizationService,
    policy: AccessPolicy,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(
        GateState {
            authorization_service: authorization_service.clone(),
            policy: Arc::new(policy),
        },
        enforce_access,
    ))
}

async fn enforce_access(
    State(gate): State<GateState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = request.extensions().get::<UserIdentity>().cloned();
    let mut memo = request
        .extensions_mut()
        .remove::<RequestPermissionMemo>()
        .unwrap_or_default();

    let decision = gate
        .authorization_service
        .authorize(
            identity.as_ref().map(UserIdentity::role),
            &gate.policy,
            &mut memo,
        )
        .await?;

    if let AccessDecision::Denied(reason) = decision {
        info!(
            subject = identity.as_ref().map(UserIdentity::subject),
            role = identity.as_ref().map(|caller| caller.role().as_str()),
            reason = reason.as_str(),
            path = request.uri().path(),
            "request denied by access gate"
        );
    }
    decision_into_result(decision)?;

    request.extensions_mut().insert(memo);
    Ok(next.run(request).await)
}
