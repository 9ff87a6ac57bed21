use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use clinic_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::auth::{SESSION_ABSOLUTE_LIFETIME_SECONDS, SESSION_CREATED_AT_KEY, SESSION_USER_KEY};
use crate::error::ApiResult;
use crate::state::AppState;

mod gate;

pub use gate::{gate_router, gated};

/// Copies the session identity, when present, into request extensions.
///
/// Never rejects; the access gate decides what an anonymous caller may reach.
/// Sessions past their absolute lifetime are flushed and treated as anonymous.
pub async fn attach_session_identity(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read session identity: {error}"))
        })?;

    if let Some(identity) = identity {
        let created_at = session
            .get::<i64>(SESSION_CREATED_AT_KEY)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read session creation time: {error}"))
            })?;

        if session_expired(created_at, Utc::now().timestamp()) {
            session.flush().await.map_err(|error| {
                AppError::Internal(format!("failed to flush expired session: {error}"))
            })?;
            info!(subject = identity.subject(), "session exceeded absolute lifetime");
        } else {
            request.extensions_mut().insert(identity);
        }
    }

    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok());

        if !request_source_matches(origin, referer, state.frontend_url.as_str()) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

/// `Origin` must equal the frontend origin exactly. `Referer` is consulted
/// only when `Origin` is absent and must sit under the frontend origin.
fn request_source_matches(origin: Option<&str>, referer: Option<&str>, allowed: &str) -> bool {
    let allowed = allowed.trim_end_matches('/');

    match (origin, referer) {
        (Some(origin), _) => origin == allowed,
        (None, Some(referer)) => {
            referer == allowed
                || referer
                    .strip_prefix(allowed)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        (None, None) => false,
    }
}

fn session_expired(created_at: Option<i64>, now: i64) -> bool {
    created_at.is_none_or(|created_at| now - created_at > SESSION_ABSOLUTE_LIFETIME_SECONDS)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
