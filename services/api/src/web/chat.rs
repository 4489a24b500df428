//! services/api/src/web/chat.rs
//!
//! The AI chat: conversations, questions and the optional attached document.

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use classmate_core::domain::{
    ChatMessage, Conversation, DocumentContext, DocumentKind, LoginSession,
};
use classmate_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::CurrentSession;
use crate::web::port_error;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub question: String,
    /// Defaults to the session's current conversation, or a new one.
    pub conversation_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    pub answer: String,
    /// `system`, `document`, `lectures` or `external`.
    pub source: String,
    pub source_caption: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct MessageView {
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_caption: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationView {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub messages: Vec<MessageView>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentStatus {
    pub attached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub characters: usize,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            last_modified: conversation.last_modified,
            message_count: conversation.messages.len(),
        }
    }
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            source: message.source.map(|s| s.as_str().to_string()),
            source_caption: message.source.map(|s| s.caption().to_string()),
        }
    }
}

impl From<Conversation> for ConversationView {
    fn from(conversation: Conversation) -> Self {
        Self {
            messages: conversation.messages.iter().map(MessageView::from).collect(),
            id: conversation.id,
            title: conversation.title,
            created_at: conversation.created_at,
            last_modified: conversation.last_modified,
        }
    }
}

impl From<Option<&DocumentContext>> for DocumentStatus {
    fn from(document: Option<&DocumentContext>) -> Self {
        let document = document.filter(|doc| doc.has_text());
        Self {
            attached: document.is_some(),
            file_name: document.map(|d| d.file_name.clone()),
            characters: document.map(|d| d.text.chars().count()).unwrap_or(0),
        }
    }
}

async fn save_session(state: &AppState, session: &LoginSession) -> Result<(), (StatusCode, String)> {
    state
        .sessions
        .update_session(session)
        .await
        .map_err(|e| port_error("Failed to update login session", e))
}

//=========================================================================================
// Conversations
//=========================================================================================

/// List the user's conversations, most recently modified first.
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "Conversation summaries", body = [ConversationSummary]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let conversations = state
        .conversations
        .list_conversations(&session.username)
        .await
        .map_err(|e| port_error("Failed to list conversations", e))?;
    let summaries: Vec<ConversationSummary> =
        conversations.iter().map(ConversationSummary::from).collect();
    Ok(Json(summaries))
}

/// Start a new conversation and make it the current one.
#[utoipa::path(
    post,
    path = "/conversations",
    responses(
        (status = 201, description = "Conversation created", body = ConversationView),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn new_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let conversation = Conversation::new(Utc::now());
    state
        .conversations
        .save_conversation(&session.username, &conversation)
        .await
        .map_err(|e| port_error("Failed to save conversation", e))?;

    session.current_conversation = Some(conversation.id);
    save_session(&state, &session).await?;

    Ok((StatusCode::CREATED, Json(ConversationView::from(conversation))))
}

/// Open a saved conversation and make it the current one.
#[utoipa::path(
    get,
    path = "/conversations/{id}",
    params(("id" = Uuid, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "The conversation", body = ConversationView),
        (status = 404, description = "No such conversation")
    )
)]
pub async fn get_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let conversation = state
        .conversations
        .load_conversation(&session.username, id)
        .await
        .map_err(|e| port_error("Failed to load conversation", e))?;

    if session.current_conversation != Some(id) {
        session.current_conversation = Some(id);
        save_session(&state, &session).await?;
    }
    Ok(Json(ConversationView::from(conversation)))
}

//=========================================================================================
// Chat
//=========================================================================================

/// The conversation a question belongs to. A stale current conversation
/// (deleted from disk) starts a fresh one; an explicitly requested one must exist.
async fn conversation_for(
    state: &AppState,
    session: &LoginSession,
    requested: Option<Uuid>,
) -> Result<Conversation, (StatusCode, String)> {
    let conversations = &state.conversations;
    if let Some(id) = requested {
        return conversations
            .load_conversation(&session.username, id)
            .await
            .map_err(|e| port_error("Failed to load conversation", e));
    }
    match session.current_conversation {
        Some(id) => match conversations.load_conversation(&session.username, id).await {
            Ok(conversation) => Ok(conversation),
            Err(PortError::NotFound(_)) => {
                warn!("Current conversation {} is gone, starting a new one", id);
                Ok(Conversation::new(Utc::now()))
            }
            Err(e) => Err(port_error("Failed to load conversation", e)),
        },
        None => Ok(Conversation::new(Utc::now())),
    }
}

/// Ask a question.
///
/// The lecture archive is re-read for every question. Failures of the AI
/// service come back as a normal answer explaining what went wrong.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer and where it came from", body = ChatResponse),
        (status = 400, description = "Blank question"),
        (status = 404, description = "No such conversation")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question must not be empty".to_string()));
    }

    // 1. Record the question
    let mut conversation = conversation_for(&state, &session, req.conversation_id).await?;
    conversation.push(ChatMessage::user(question), Utc::now());

    // 2. Route it
    let corpus = state.archive.load_corpus().await.map_err(|e| {
        error!("Failed to load lecture corpus: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read lecture archive".to_string())
    })?;
    if corpus.context().is_empty() {
        info!("Answering without lecture content: {}", corpus.as_text());
    }
    let routed = state
        .answer_router
        .answer(question, corpus.context(), session.document.as_ref())
        .await;

    // 3. Record the answer
    conversation.push(
        ChatMessage::assistant(routed.answer.clone(), routed.source),
        Utc::now(),
    );
    state
        .conversations
        .save_conversation(&session.username, &conversation)
        .await
        .map_err(|e| port_error("Failed to save conversation", e))?;

    if session.current_conversation != Some(conversation.id) {
        session.current_conversation = Some(conversation.id);
        save_session(&state, &session).await?;
    }

    Ok(Json(ChatResponse {
        conversation_id: conversation.id,
        answer: routed.answer,
        source: routed.source.as_str().to_string(),
        source_caption: routed.source.caption().to_string(),
    }))
}

//=========================================================================================
// Attached document
//=========================================================================================

/// Attach a PDF or Word document to the chat session.
///
/// Accepts multipart/form-data with a single `file` part. If the document
/// cannot be read, the previously attached document (if any) stays attached.
#[utoipa::path(
    post,
    path = "/chat/document",
    request_body(content_type = "multipart/form-data", description = "The document to attach."),
    responses(
        (status = 200, description = "Document attached", body = DocumentStatus),
        (status = 400, description = "Missing file or unsupported file type"),
        (status = 422, description = "The document could not be read")
    )
)]
pub async fn attach_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("untitled").to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        upload = Some((file_name, data.to_vec()));
    }
    let (file_name, bytes) = upload.ok_or((
        StatusCode::BAD_REQUEST,
        "Multipart form must include a file".to_string(),
    ))?;

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let kind = extension
        .parse::<DocumentKind>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let document = state
        .documents
        .extract(&file_name, kind, bytes)
        .await
        .map_err(|e| {
            warn!("Could not read {}: {}", file_name, e);
            match e {
                PortError::Invalid(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
                other => port_error("Failed to extract document text", other),
            }
        })?;
    info!(
        "{} attached {} ({} characters)",
        session.username,
        document.file_name,
        document.text.len()
    );

    session.document = Some(document);
    save_session(&state, &session).await?;
    Ok(Json(DocumentStatus::from(session.document.as_ref())))
}

/// Show which document is attached.
#[utoipa::path(
    get,
    path = "/chat/document",
    responses((status = 200, description = "Attached document, if any", body = DocumentStatus))
)]
pub async fn document_status_handler(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> impl IntoResponse {
    Json(DocumentStatus::from(session.document.as_ref()))
}

/// Detach the document.
#[utoipa::path(
    delete,
    path = "/chat/document",
    responses((status = 200, description = "Document cleared", body = DocumentStatus))
)]
pub async fn clear_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(mut session)): Extension<CurrentSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if session.document.take().is_some() {
        save_session(&state, &session).await?;
    }
    Ok(Json(DocumentStatus::from(None::<&DocumentContext>)))
}
