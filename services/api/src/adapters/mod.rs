pub mod archive;
pub mod conversations;
pub mod credentials;
pub mod documents;
pub mod llm;
pub mod notes_render;
pub mod sessions;

pub use archive::FsLectureArchive;
pub use conversations::FsConversationStore;
pub use credentials::JsonCredentialStore;
pub use documents::LocalDocumentExtractor;
pub use llm::OpenAiTextAdapter;
pub use notes_render::LocalNotesRenderer;
pub use sessions::{FileSessionStore, MemorySessionStore};
