//! services/api/src/adapters/sessions.rs
//!
//! Login session stores: an in-memory map, and a JSON file that is read and
//! rewritten wholesale on every change so sessions survive a restart.

use async_trait::async_trait;
use classmate_core::domain::LoginSession;
use classmate_core::ports::{PortError, PortResult, SessionStore};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, LoginSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> PortError {
    PortError::Unexpected("Session store lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, session: &LoginSession) -> PortResult<()> {
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, token: &str) -> PortResult<Option<LoginSession>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(token).cloned())
    }

    async fn update_session(&self, session: &LoginSession) -> PortResult<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        match sessions.get_mut(&session.token) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(PortError::NotFound("Session not found".to_string())),
        }
    }

    async fn delete_session(&self, token: &str) -> PortResult<()> {
        self.sessions.write().map_err(poisoned)?.remove(token);
        Ok(())
    }
}

/// Sessions kept in a single JSON file (`token -> session`).
#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> PortResult<HashMap<String, LoginSession>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| PortError::Unexpected(format!("Malformed session file: {}", e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn write_all(&self, sessions: &HashMap<String, LoginSession>) -> PortResult<()> {
        let json = serde_json::to_string_pretty(sessions)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create_session(&self, session: &LoginSession) -> PortResult<()> {
        let mut sessions = self.read_all().await?;
        sessions.insert(session.token.clone(), session.clone());
        self.write_all(&sessions).await
    }

    async fn get_session(&self, token: &str) -> PortResult<Option<LoginSession>> {
        Ok(self.read_all().await?.remove(token))
    }

    async fn update_session(&self, session: &LoginSession) -> PortResult<()> {
        let mut sessions = self.read_all().await?;
        if !sessions.contains_key(&session.token) {
            return Err(PortError::NotFound("Session not found".to_string()));
        }
        sessions.insert(session.token.clone(), session.clone());
        self.write_all(&sessions).await
    }

    async fn delete_session(&self, token: &str) -> PortResult<()> {
        let mut sessions = self.read_all().await?;
        if sessions.remove(token).is_some() {
            self.write_all(&sessions).await?;
        }
        Ok(())
    }
}
