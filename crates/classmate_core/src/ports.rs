//! crates/classmate_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the filesystem, the LLM provider and the document
//! parsing libraries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Conversation, DocumentContext, DocumentKind, LectureKey, LoginSession, NotesDocument,
    NotesFormat, UserCredentials,
};
use crate::lecture::{LectureCorpus, PreparedLecture};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Why a call to the generative-answer client produced no usable text.
///
/// The `Display` text of each variant is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    #[error("⚠️ The AI returned an empty response. The answer may have been blocked by a safety filter; please try rephrasing your question.")]
    EmptyResponse,
    #[error("⚠️ The AI service rejected the request (rate limit or API error): {0}. Please wait a moment and try again.")]
    Api(String),
    #[error("⚠️ Something went wrong while contacting the AI service: {0}")]
    Other(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks a user up by exact username. The store is never written.
    async fn find_user(&self, username: &str) -> PortResult<Option<UserCredentials>>;

    /// Checks a submitted password against the stored one.
    fn verify_password(&self, credentials: &UserCredentials, password: &str) -> bool;
}

#[async_trait]
pub trait LectureArchive: Send + Sync {
    /// Writes the media file and its placeholder transcript.
    async fn store_lecture(&self, lecture: &PreparedLecture) -> PortResult<LectureKey>;

    async fn list_subjects(&self) -> PortResult<Vec<String>>;

    async fn list_units(&self, subject: &str) -> PortResult<Vec<String>>;

    async fn list_dates(&self, subject: &str, unit: &str) -> PortResult<Vec<String>>;

    /// Media files (not transcripts) stored for one date.
    async fn list_lectures(&self, subject: &str, unit: &str, date: &str)
        -> PortResult<Vec<String>>;

    async fn read_media(&self, key: &LectureKey) -> PortResult<Vec<u8>>;

    async fn read_transcript(&self, key: &LectureKey) -> PortResult<String>;

    /// Concatenates every transcript in the archive. Re-read on every call.
    async fn load_corpus(&self) -> PortResult<LectureCorpus>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn list_conversations(&self, username: &str) -> PortResult<Vec<Conversation>>;

    async fn load_conversation(&self, username: &str, id: Uuid) -> PortResult<Conversation>;

    /// Rewrites the whole conversation record.
    async fn save_conversation(&self, username: &str, conversation: &Conversation)
        -> PortResult<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &LoginSession) -> PortResult<()>;

    async fn get_session(&self, token: &str) -> PortResult<Option<LoginSession>>;

    async fn update_session(&self, session: &LoginSession) -> PortResult<()>;

    async fn delete_session(&self, token: &str) -> PortResult<()>;
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Pulls plain text out of an uploaded document.
    async fn extract(
        &self,
        file_name: &str,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> PortResult<DocumentContext>;
}

#[async_trait]
pub trait GenerativeTextService: Send + Sync {
    /// Sends a single prompt to the model and returns its text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure>;

    /// Like `generate`, but a failure becomes its user-facing explanation,
    /// so the caller always receives text back.
    async fn generate_text(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(text) => text,
            Err(failure) => failure.to_string(),
        }
    }
}

pub trait NotesRenderer: Send + Sync {
    /// Renders generated notes into the bytes of a downloadable file.
    fn render(&self, notes: &NotesDocument, format: NotesFormat) -> PortResult<Vec<u8>>;
}
