//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Redirect, Response},
};
use reading_tracker_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::state::{AppState, CurrentUser};

/// Name of the cookie that carries the auth session id.
pub const SESSION_COOKIE: &str = "session";

/// Pulls the auth session id out of the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// Resolves the request's identity from its session cookie.
///
/// Missing, unknown, and expired sessions all yield `None`. Backend failures
/// are logged and also treated as "not logged in".
pub async fn resolve_current_user(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    let auth_session_id = session_id_from_headers(headers)?;

    let user_id = match state.db.validate_auth_session(auth_session_id).await {
        Ok(user_id) => user_id,
        Err(PortError::Unauthorized) => {
            debug!("Rejected unknown or expired auth session");
            return None;
        }
        Err(e) => {
            error!("Failed to validate auth session: {:?}", e);
            return None;
        }
    };

    match state.db.get_user_by_id(user_id).await {
        Ok(user) => Some(CurrentUser {
            user_id: user.user_id,
            username: user.username,
        }),
        Err(e) => {
            error!("Session {} points at a missing user: {:?}", user_id, e);
            None
        }
    }
}

/// Middleware that validates the auth session cookie and attaches the caller's identity.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid or missing, redirects to `/`, where the login prompt is served.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Redirect> {
    let current_user = resolve_current_user(&state, req.headers())
        .await
        .ok_or_else(|| Redirect::to("/"))?;

    req.extensions_mut().insert(current_user);

    Ok(next.run(req).await)
}
