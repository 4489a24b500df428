pub mod auth;
pub mod chat;
pub mod lectures;
pub mod middleware;
pub mod navigation;
pub mod notes;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use classmate_core::ports::PortError;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::error::ApiError;
pub use middleware::require_auth;
use state::AppState;

/// Logs a port failure and maps it to a status code and a message fit for the user.
pub(crate) fn port_error(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        PortError::Invalid(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
        PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, context.to_string()),
    }
}

/// Builds the API router: public routes, routes behind `require_auth`, and the
/// body limit, CORS and tracing layers.
pub fn create_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/session", get(navigation::session_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/lectures",
            get(lectures::list_subjects_handler).post(lectures::upload_lecture_handler),
        )
        .route("/lectures/{subject}", get(lectures::list_units_handler))
        .route("/lectures/{subject}/{unit}", get(lectures::list_dates_handler))
        .route(
            "/lectures/{subject}/{unit}/{date}",
            get(lectures::list_lectures_handler),
        )
        .route(
            "/lectures/{subject}/{unit}/{date}/{file}",
            get(lectures::lecture_media_handler),
        )
        .route(
            "/lectures/{subject}/{unit}/{date}/{file}/transcript",
            get(lectures::lecture_transcript_handler),
        )
        .route(
            "/conversations",
            get(chat::list_conversations_handler).post(chat::new_conversation_handler),
        )
        .route("/conversations/{id}", get(chat::get_conversation_handler))
        .route("/chat", post(chat::chat_handler))
        .route(
            "/chat/document",
            get(chat::document_status_handler)
                .post(chat::attach_document_handler)
                .delete(chat::clear_document_handler),
        )
        .route("/notes", post(notes::notes_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let max_upload_bytes = app_state.config.max_upload_bytes;
    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
