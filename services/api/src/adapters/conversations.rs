//! services/api/src/adapters/conversations.rs
//!
//! Persists chat conversations as one JSON file each under
//! `<chat_history>/<user>/conversations/<id>.json`.

use async_trait::async_trait;
use classmate_core::domain::Conversation;
use classmate_core::ports::{ConversationStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::archive::safe_segment;

#[derive(Clone)]
pub struct FsConversationStore {
    root: PathBuf,
}

impl FsConversationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, username: &str) -> PortResult<PathBuf> {
        Ok(self
            .root
            .join(safe_segment(username)?)
            .join("conversations"))
    }

    fn conversation_path(&self, username: &str, id: Uuid) -> PortResult<PathBuf> {
        Ok(self.user_dir(username)?.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl ConversationStore for FsConversationStore {
    /// Most recently modified first. Unreadable files are skipped.
    async fn list_conversations(&self, username: &str) -> PortResult<Vec<Conversation>> {
        let dir = self.user_dir(username)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };

        let mut conversations = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    serde_json::from_str::<Conversation>(&raw).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => warn!("Skipping unreadable conversation {:?}: {}", path, e),
            }
        }

        conversations.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(conversations)
    }

    async fn load_conversation(&self, username: &str, id: Uuid) -> PortResult<Conversation> {
        let path = self.conversation_path(username, id)?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PortError::NotFound(format!("Conversation {} not found", id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        serde_json::from_str(&raw).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn save_conversation(
        &self,
        username: &str,
        conversation: &Conversation,
    ) -> PortResult<()> {
        let dir = self.user_dir(username)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let json = serde_json::to_string_pretty(conversation)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let path = self.conversation_path(username, conversation.id)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use classmate_core::domain::{ChatMessage, SourceLabel};

    #[tokio::test]
    async fn saved_conversations_read_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConversationStore::new(dir.path());

        let now = Utc::now();
        let mut conversation = Conversation::new(now);
        conversation.push(ChatMessage::user("What is a heap?"), now);
        conversation.push(
            ChatMessage::assistant("A tree-based priority structure.", SourceLabel::Lectures),
            now + Duration::milliseconds(1500),
        );
        store.save_conversation("alice", &conversation).await.unwrap();

        let path = dir
            .path()
            .join("alice/conversations")
            .join(format!("{}.json", conversation.id));
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        for field in ["id", "title", "created_at", "last_modified", "messages"] {
            assert!(on_disk.get(field).is_some(), "missing {}", field);
        }

        let loaded = store.load_conversation("alice", conversation.id).await.unwrap();
        assert_eq!(loaded, conversation);
    }

    #[tokio::test]
    async fn conversations_are_listed_newest_first_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConversationStore::new(dir.path());

        let older = Conversation::new(Utc::now() - Duration::hours(1));
        let newer = Conversation::new(Utc::now());
        store.save_conversation("bob", &older).await.unwrap();
        store.save_conversation("bob", &newer).await.unwrap();
        store.save_conversation("carol", &Conversation::new(Utc::now())).await.unwrap();

        let listed = store.list_conversations("bob").await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert!(store.list_conversations("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConversationStore::new(dir.path());
        assert!(matches!(
            store.load_conversation("bob", Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }
}
