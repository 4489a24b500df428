pub mod answer;
pub mod domain;
pub mod lecture;
pub mod navigation;
pub mod notes;
pub mod ports;

pub use answer::{AnswerPolicy, AnswerRouter, RoutedAnswer};
pub use domain::{
    ChatMessage, ChatRole, Conversation, DocumentContext, DocumentKind, LectureKey, LoginSession,
    MediaKind, NotesDocument, NotesFormat, Role, SourceLabel, User, UserCredentials,
};
pub use lecture::{LectureCorpus, LectureForm, LectureSource, PreparedLecture, UploadError};
pub use navigation::{Page, SessionContext};
pub use ports::{
    ConversationStore, CredentialStore, DocumentExtractor, GenerationFailure,
    GenerativeTextService, LectureArchive, NotesRenderer, PortError, PortResult, SessionStore,
};
