//! services/api/src/web/notes.rs
//!
//! Generates downloadable study notes from a lecture transcript.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use classmate_core::domain::{LectureKey, NotesFormat};
use classmate_core::lecture::sanitize_token;
use classmate_core::notes::{generate_notes, NotesRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::port_error;
use crate::web::state::AppState;

/// A stored lecture, addressed the same way as in the archive viewer.
#[derive(Deserialize, ToSchema)]
pub struct LectureRef {
    pub subject: String,
    pub unit: String,
    pub date: String,
    pub file: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NotesBody {
    pub title: String,
    pub subject: String,
    /// Defaults to the lecture's date, or today.
    pub date: Option<NaiveDate>,
    /// `pdf` or `docx`.
    #[schema(value_type = String, example = "pdf")]
    pub format: NotesFormat,
    /// Inline transcript text. Give this or `lecture`, not both.
    pub transcript: Option<String>,
    pub lecture: Option<LectureRef>,
}

fn attachment_name(title: &str, format: NotesFormat) -> String {
    let stem = sanitize_token(title);
    let stem = if stem.is_empty() { "lecture".to_string() } else { stem };
    format!("{}_notes.{}", stem, format.extension())
}

fn header_value(value: &str) -> Result<HeaderValue, (StatusCode, String)> {
    HeaderValue::from_str(value).map_err(|e| {
        error!("Invalid response header {:?}: {:?}", value, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response".to_string())
    })
}

/// Generate study notes as a PDF or Word download.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = NotesBody,
    responses(
        (status = 200, description = "The notes file as an attachment"),
        (status = 400, description = "Give exactly one of `transcript` or `lecture`"),
        (status = 404, description = "No transcript for the lecture"),
        (status = 502, description = "The AI service could not generate notes")
    )
)]
pub async fn notes_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NotesBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Find the transcript
    let (transcript, lecture_date) = match (body.transcript, body.lecture) {
        (Some(text), None) if !text.trim().is_empty() => (text, None),
        (None, Some(lecture)) => {
            let key = LectureKey {
                subject: lecture.subject,
                unit: lecture.unit,
                date: lecture.date,
                file: lecture.file,
            };
            let text = state
                .archive
                .read_transcript(&key)
                .await
                .map_err(|e| port_error("Failed to read transcript", e))?;
            (text, NaiveDate::parse_from_str(&key.date, "%Y-%m-%d").ok())
        }
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Provide exactly one of a non-empty transcript or a lecture".to_string(),
            ))
        }
    };

    // 2. Generate the notes
    let request = NotesRequest {
        title: body.title,
        subject: body.subject,
        date: body
            .date
            .or(lecture_date)
            .unwrap_or_else(|| Local::now().date_naive()),
        transcript,
    };
    let notes = generate_notes(state.notes_llm.as_ref(), request)
        .await
        .map_err(|failure| {
            error!("Notes generation failed: {:?}", failure);
            (StatusCode::BAD_GATEWAY, failure.to_string())
        })?;

    // 3. Render the download
    let format = body.format;
    let file_name = attachment_name(&notes.title, format);
    let renderer = state.notes_renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&notes, format))
        .await
        .map_err(|e| {
            error!("Notes rendering task failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render notes".to_string())
        })?
        .map_err(|e| port_error("Failed to render notes", e))?;
    info!("Rendered {} ({} bytes)", file_name, bytes.len());

    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (header::CONTENT_TYPE, header_value(format.content_type())?),
            (header::CONTENT_DISPOSITION, header_value(&disposition)?),
        ],
        bytes,
    ))
}
