//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the health check.

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, chat, lectures, navigation, notes};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::login_handler,
        auth::logout_handler,
        navigation::session_handler,
        lectures::upload_lecture_handler,
        lectures::list_subjects_handler,
        lectures::list_units_handler,
        lectures::list_dates_handler,
        lectures::list_lectures_handler,
        lectures::lecture_media_handler,
        lectures::lecture_transcript_handler,
        chat::list_conversations_handler,
        chat::new_conversation_handler,
        chat::get_conversation_handler,
        chat::chat_handler,
        chat::attach_document_handler,
        chat::document_status_handler,
        chat::clear_document_handler,
        notes::notes_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            navigation::SessionView,
            lectures::UploadResponse,
            lectures::ListingResponse,
            lectures::TranscriptResponse,
            chat::ChatRequest,
            chat::ChatResponse,
            chat::ConversationSummary,
            chat::ConversationView,
            chat::MessageView,
            chat::DocumentStatus,
            notes::NotesBody,
            notes::LectureRef,
        )
    ),
    tags(
        (name = "Classmate AI API", description = "Lecture archive, AI chat and notes for the classroom.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
