//! services/api/src/web/lectures.rs
//!
//! Lecture upload (staff only) and the archive viewer.

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{Local, NaiveDate, NaiveTime};
use classmate_core::domain::{LectureKey, MediaKind};
use classmate_core::lecture::{LectureForm, LectureSource, NO_ARCHIVE_MESSAGE};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::middleware::CurrentSession;
use crate::web::port_error;
use crate::web::state::AppState;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub subject: String,
    pub unit: String,
    pub date: String,
    pub file: String,
    pub transcript: String,
}

/// One level of the archive tree.
#[derive(Serialize, ToSchema)]
pub struct ListingResponse {
    pub items: Vec<String>,
    /// Set when there is nothing to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TranscriptResponse {
    pub file: String,
    pub transcript: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

/// Reads the upload form. An empty `date`/`time` means "now".
async fn read_form(multipart: &mut Multipart) -> Result<LectureForm, (StatusCode, String)> {
    let mut form = LectureForm::default();
    let mut file: Option<LectureSource> = None;
    let mut recording: Option<LectureSource> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read file bytes: {}", e)))?;
                if !bytes.is_empty() {
                    file = Some(LectureSource::File {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "recording" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read recording bytes: {}", e)))?;
                if !bytes.is_empty() {
                    recording = Some(LectureSource::Recording {
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "subject" | "unit" | "topic" | "date" | "time" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read {}: {}", field_name, e)))?;
                let value = value.trim().to_string();
                match field_name.as_str() {
                    "subject" => form.subject = value,
                    "unit" => form.unit = value,
                    "topic" => form.topic = value,
                    "date" if !value.is_empty() => {
                        form.date = Some(NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(
                            |_| bad_request(format!("Invalid date '{}', expected YYYY-MM-DD", value)),
                        )?)
                    }
                    "time" if !value.is_empty() => {
                        form.time = Some(NaiveTime::parse_from_str(&value, "%H:%M").map_err(
                            |_| bad_request(format!("Invalid time '{}', expected HH:MM", value)),
                        )?)
                    }
                    _ => {}
                }
            }
            other => warn!("Ignoring unexpected upload field '{}'", other),
        }
    }

    // A picked file wins over a recording.
    form.source = file.or(recording);
    Ok(form)
}

//=========================================================================================
// Upload
//=========================================================================================

/// Upload a lecture recording.
///
/// Accepts multipart/form-data with `subject`, `unit`, `topic`, optional
/// `date` (YYYY-MM-DD) and `time` (HH:MM), plus either a `file` part
/// (mp4, mp3 or wav) or a `recording` part (stored as mp3).
#[utoipa::path(
    post,
    path = "/lectures",
    request_body(content_type = "multipart/form-data", description = "The lecture form."),
    responses(
        (status = 201, description = "Lecture stored", body = UploadResponse),
        (status = 400, description = "Missing fields or unsupported media; nothing was written"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Only staff can upload lectures")
    )
)]
pub async fn upload_lecture_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !session.role.can_upload() {
        return Err((
            StatusCode::FORBIDDEN,
            "Only staff can upload lectures".to_string(),
        ));
    }

    let form = read_form(&mut multipart).await?;
    let now = Local::now();
    let lecture = form
        .prepare(now.date_naive(), now.time())
        .map_err(|e| bad_request(e.to_string()))?;

    let key = state
        .archive
        .store_lecture(&lecture)
        .await
        .map_err(|e| port_error("Failed to store lecture", e))?;
    info!("{} uploaded {}", session.username, key.file);

    let transcript = key.transcript_file();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "✅ Lecture uploaded successfully".to_string(),
            subject: key.subject,
            unit: key.unit,
            date: key.date,
            file: key.file,
            transcript,
        }),
    ))
}

//=========================================================================================
// Viewer
//=========================================================================================

/// List the subjects in the archive.
#[utoipa::path(
    get,
    path = "/lectures",
    responses(
        (status = 200, description = "Subjects, or an informational message", body = ListingResponse)
    )
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .archive
        .list_subjects()
        .await
        .map_err(|e| port_error("Failed to list subjects", e))?;
    let message = items
        .is_empty()
        .then(|| NO_ARCHIVE_MESSAGE.trim_end_matches('.').to_string());
    Ok(Json(ListingResponse { items, message }))
}

/// List the units of a subject.
#[utoipa::path(
    get,
    path = "/lectures/{subject}",
    params(("subject" = String, Path, description = "Subject folder")),
    responses(
        (status = 200, description = "Units", body = ListingResponse),
        (status = 400, description = "Invalid path segment")
    )
)]
pub async fn list_units_handler(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .archive
        .list_units(&subject)
        .await
        .map_err(|e| port_error("Failed to list units", e))?;
    Ok(Json(ListingResponse { items, message: None }))
}

/// List the lecture dates of a unit.
#[utoipa::path(
    get,
    path = "/lectures/{subject}/{unit}",
    params(
        ("subject" = String, Path, description = "Subject folder"),
        ("unit" = String, Path, description = "Unit folder")
    ),
    responses(
        (status = 200, description = "Dates (YYYY-MM-DD)", body = ListingResponse),
        (status = 400, description = "Invalid path segment")
    )
)]
pub async fn list_dates_handler(
    State(state): State<Arc<AppState>>,
    Path((subject, unit)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .archive
        .list_dates(&subject, &unit)
        .await
        .map_err(|e| port_error("Failed to list dates", e))?;
    Ok(Json(ListingResponse { items, message: None }))
}

/// List the recordings stored for one date.
#[utoipa::path(
    get,
    path = "/lectures/{subject}/{unit}/{date}",
    params(
        ("subject" = String, Path, description = "Subject folder"),
        ("unit" = String, Path, description = "Unit folder"),
        ("date" = String, Path, description = "Date folder (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Lecture media files", body = ListingResponse),
        (status = 400, description = "Invalid path segment")
    )
)]
pub async fn list_lectures_handler(
    State(state): State<Arc<AppState>>,
    Path((subject, unit, date)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .archive
        .list_lectures(&subject, &unit, &date)
        .await
        .map_err(|e| port_error("Failed to list lectures", e))?;
    Ok(Json(ListingResponse { items, message: None }))
}

/// Stream a lecture's media with its content type.
#[utoipa::path(
    get,
    path = "/lectures/{subject}/{unit}/{date}/{file}",
    params(
        ("subject" = String, Path, description = "Subject folder"),
        ("unit" = String, Path, description = "Unit folder"),
        ("date" = String, Path, description = "Date folder (YYYY-MM-DD)"),
        ("file" = String, Path, description = "Media file name")
    ),
    responses(
        (status = 200, description = "The recording bytes"),
        (status = 400, description = "Invalid path segment or not a recording"),
        (status = 404, description = "No such lecture")
    )
)]
pub async fn lecture_media_handler(
    State(state): State<Arc<AppState>>,
    Path((subject, unit, date, file)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = LectureKey {
        subject,
        unit,
        date,
        file,
    };
    let bytes = state
        .archive
        .read_media(&key)
        .await
        .map_err(|e| port_error("Failed to read lecture media", e))?;
    let content_type = MediaKind::from_file_name(&key.file)
        .map(|kind| kind.content_type())
        .unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Read a lecture's transcript.
#[utoipa::path(
    get,
    path = "/lectures/{subject}/{unit}/{date}/{file}/transcript",
    params(
        ("subject" = String, Path, description = "Subject folder"),
        ("unit" = String, Path, description = "Unit folder"),
        ("date" = String, Path, description = "Date folder (YYYY-MM-DD)"),
        ("file" = String, Path, description = "Media file name")
    ),
    responses(
        (status = 200, description = "The transcript", body = TranscriptResponse),
        (status = 404, description = "No transcript for this lecture")
    )
)]
pub async fn lecture_transcript_handler(
    State(state): State<Arc<AppState>>,
    Path((subject, unit, date, file)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = LectureKey {
        subject,
        unit,
        date,
        file,
    };
    let transcript = state
        .archive
        .read_transcript(&key)
        .await
        .map_err(|e| port_error("Failed to read transcript", e))?;
    Ok(Json(TranscriptResponse {
        file: key.transcript_file(),
        transcript,
    }))
}
