//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use classmate_core::domain::LoginSession;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::LoginPersistence;
use crate::web::middleware::{extract_token, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    /// `student` or `staff`.
    pub role: String,
    /// Only returned when tokens travel as a `?session=` query parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

fn session_cookie(token: &str) -> String {
    format!("{}={}; HttpOnly; Secure; SameSite=Lax; Path=/", SESSION_COOKIE, token)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Login with a username from the credential file
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());

    // 1. Look the user up (the file is re-read on every attempt)
    let credentials = state
        .credentials
        .find_user(&req.username)
        .await
        .map_err(|e| {
            error!("Failed to read credentials: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
        })?
        .ok_or_else(invalid)?;

    // 2. Verify password
    if !state.credentials.verify_password(&credentials, &req.password) {
        warn!("Rejected login for {}", req.username);
        return Err(invalid());
    }

    // 3. Create the login session
    let user = credentials.to_user();
    let session = LoginSession::new(&user, Utc::now());
    state.sessions.create_session(&session).await.map_err(|e| {
        error!("Failed to create login session: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
    })?;
    info!("{} logged in as {}", user.username, user.role);

    // 4. Deliver the token
    let mut headers = HeaderMap::new();
    let session_token = match state.config.login_persistence {
        LoginPersistence::QueryParam => Some(session.token.clone()),
        LoginPersistence::Cookie | LoginPersistence::SessionFile => {
            let cookie = HeaderValue::from_str(&session_cookie(&session.token)).map_err(|e| {
                error!("Failed to build session cookie: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
            })?;
            headers.insert(header::SET_COOKIE, cookie);
            None
        }
    };

    let response = LoginResponse {
        username: user.username,
        role: user.role.to_string(),
        session_token,
    };
    Ok((StatusCode::OK, headers, Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Extract the login token
    let token = extract_token(state.config.login_persistence, &headers, &uri)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Delete the login session
    state.sessions.delete_session(&token).await.map_err(|e| {
        error!("Failed to delete login session: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
    })?;

    // 3. Clear cookie
    let cookie = format!("{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
