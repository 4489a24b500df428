//! crates/classmate_core/src/domain.rs
//!
//! Defines the core data structures for the application: users, lectures,
//! chat conversations and the per-login session record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Title given to a conversation until its first user message arrives.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Chat";

const TITLE_MAX_CHARS: usize = 40;

//=========================================================================================
// Users
//=========================================================================================

/// The two kinds of account known to the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }

    /// Only staff may add lectures to the archive.
    pub fn can_upload(&self) -> bool {
        matches!(self, Role::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logged-in user as seen by the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub role: Role,
}

// Only used internally for login - contains the stored password
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl UserCredentials {
    pub fn to_user(&self) -> User {
        User {
            username: self.username.clone(),
            role: self.role,
        }
    }
}

//=========================================================================================
// Lectures
//=========================================================================================

/// Identifies one stored lecture. The archive path *is* the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureKey {
    pub subject: String,
    pub unit: String,
    pub date: String,
    pub file: String,
}

impl LectureKey {
    /// Name of the sidecar transcript: same stem, `.txt` extension.
    pub fn transcript_file(&self) -> String {
        match self.file.rsplit_once('.') {
            Some((stem, _)) => format!("{}.txt", stem),
            None => format!("{}.txt", self.file),
        }
    }
}

/// The media container of a stored lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Mp4,
    Mp3,
    Wav,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Mp4, MediaKind::Mp3, MediaKind::Wav];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "mp4" => Some(MediaKind::Mp4),
            "mp3" => Some(MediaKind::Mp3),
            "wav" => Some(MediaKind::Wav),
            _ => None,
        }
    }

    /// Classifies a stored file by the end of its name, the way the viewer lists lectures.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| name.ends_with(kind.extension()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Mp4 => "mp4",
            MediaKind::Mp3 => "mp3",
            MediaKind::Wav => "wav",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Mp4 => "video/mp4",
            MediaKind::Mp3 => "audio/mpeg",
            MediaKind::Wav => "audio/wav",
        }
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Which input category nominally backed an assistant answer.
///
/// The label reflects what was *available* to the model, not what the
/// answer actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLabel {
    System,
    Document,
    Lectures,
    External,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::System => "system",
            SourceLabel::Document => "document",
            SourceLabel::Lectures => "lectures",
            SourceLabel::External => "external",
        }
    }

    /// The caption shown under an assistant message.
    pub fn caption(&self) -> &'static str {
        match self {
            SourceLabel::System => "🤖 System Response",
            SourceLabel::Document => "📄 Source: Uploaded Document",
            SourceLabel::Lectures => "📘 Source: Classroom Lectures",
            SourceLabel::External => "🌐 Source: External Knowledge (Gemini)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLabel>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            source: None,
        }
    }

    pub fn assistant(content: impl Into<String>, source: SourceLabel) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            source: Some(source),
        }
    }
}

/// A persisted, append-only sequence of chat turns owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_CONVERSATION_TITLE.to_string(),
            created_at: now,
            last_modified: now,
            messages: Vec::new(),
        }
    }

    /// Appends a message. The first user message also names the conversation.
    pub fn push(&mut self, message: ChatMessage, now: DateTime<Utc>) {
        if message.role == ChatRole::User && self.title == DEFAULT_CONVERSATION_TITLE {
            self.title = title_from(&message.content);
        }
        self.messages.push(message);
        self.last_modified = now;
    }
}

fn title_from(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head.trim_end())
    } else if trimmed.is_empty() {
        DEFAULT_CONVERSATION_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

//=========================================================================================
// Uploaded documents
//=========================================================================================

/// The document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Doc,
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Ok(DocumentKind::Doc),
            other => Err(format!("Unsupported file type: {}", other)),
        }
    }
}

/// Text pulled out of a document the user attached to their chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    pub file_name: String,
    pub text: String,
}

impl DocumentContext {
    /// Blank extractions count as no document at all.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

//=========================================================================================
// Login sessions
//=========================================================================================

/// Server-side record behind a login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub document: Option<DocumentContext>,
    #[serde(default)]
    pub current_conversation: Option<Uuid>,
}

impl LoginSession {
    pub fn new(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            username: user.username.clone(),
            role: user.role,
            created_at: now,
            document: None,
            current_conversation: None,
        }
    }

    pub fn user(&self) -> User {
        User {
            username: self.username.clone(),
            role: self.role,
        }
    }
}

//=========================================================================================
// Notes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotesFormat {
    Pdf,
    Docx,
}

impl NotesFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            NotesFormat::Pdf => "pdf",
            NotesFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            NotesFormat::Pdf => "application/pdf",
            NotesFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Generated study notes, ready to be rendered into a downloadable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesDocument {
    pub title: String,
    pub subject: String,
    pub date: NaiveDate,
    pub notes: String,
}
