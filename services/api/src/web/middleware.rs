//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use classmate_core::domain::LoginSession;
use std::sync::Arc;
use tracing::error;

use crate::config::LoginPersistence;
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_QUERY_PARAM: &str = "session";

/// The login session behind the current request, inserted by `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentSession(pub LoginSession);

/// Reads the login token from wherever the configured strategy delivers it.
pub fn extract_token(
    persistence: LoginPersistence,
    headers: &HeaderMap,
    uri: &Uri,
) -> Option<String> {
    match persistence {
        LoginPersistence::Cookie | LoginPersistence::SessionFile => headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())?
            .split(';')
            .find_map(|c| {
                let (name, value) = c.trim().split_once('=')?;
                (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
            }),
        LoginPersistence::QueryParam => uri.query()?.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == SESSION_QUERY_PARAM && !value.is_empty()).then(|| value.to_string())
        }),
    }
}

/// Looks the request's token up in the session store. A missing or unknown
/// token is `Ok(None)`; only a failing store is an error.
pub async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Option<LoginSession>, StatusCode> {
    let Some(token) = extract_token(state.config.login_persistence, headers, uri) else {
        return Ok(None);
    };
    state.sessions.get_session(&token).await.map_err(|e| {
        error!("Failed to look up login session: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Middleware that validates the login token and loads its session.
///
/// If valid, inserts a `CurrentSession` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session = resolve_session(&state, req.headers(), req.uri())
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(CurrentSession(session));
    Ok(next.run(req).await)
}
