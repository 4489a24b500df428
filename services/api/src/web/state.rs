//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{
    FileSessionStore, FsConversationStore, FsLectureArchive, JsonCredentialStore,
    LocalDocumentExtractor, LocalNotesRenderer, MemorySessionStore,
};
use crate::config::{Config, LoginPersistence};
use classmate_core::ports::{
    ConversationStore, CredentialStore, DocumentExtractor, GenerativeTextService,
    LectureArchive, NotesRenderer, SessionStore,
};
use classmate_core::AnswerRouter;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<dyn CredentialStore>,
    pub archive: Arc<dyn LectureArchive>,
    pub conversations: Arc<dyn ConversationStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub documents: Arc<dyn DocumentExtractor>,
    pub answer_router: AnswerRouter,
    pub notes_llm: Arc<dyn GenerativeTextService>,
    pub notes_renderer: Arc<dyn NotesRenderer>,
}

impl AppState {
    /// Builds the filesystem-backed adapters named by `config`. The LLM clients
    /// are passed in so tests can substitute fakes.
    pub fn from_config(
        config: Arc<Config>,
        qa_llm: Arc<dyn GenerativeTextService>,
        notes_llm: Arc<dyn GenerativeTextService>,
    ) -> Self {
        let sessions: Arc<dyn SessionStore> = match config.login_persistence {
            LoginPersistence::SessionFile => {
                Arc::new(FileSessionStore::new(config.session_file.clone()))
            }
            LoginPersistence::Cookie | LoginPersistence::QueryParam => {
                Arc::new(MemorySessionStore::new())
            }
        };

        Self {
            credentials: Arc::new(JsonCredentialStore::new(config.users_file.clone())),
            archive: Arc::new(FsLectureArchive::new(config.archive_root.clone())),
            conversations: Arc::new(FsConversationStore::new(config.chat_history_dir.clone())),
            sessions,
            documents: Arc::new(LocalDocumentExtractor::new()),
            answer_router: AnswerRouter::new(qa_llm, config.answer_policy),
            notes_llm,
            notes_renderer: Arc::new(LocalNotesRenderer::new()),
            config,
        }
    }
}
