//! services/api/src/adapters/credentials.rs
//!
//! Reads the JSON credential file (`username -> {password, role}`).
//! It implements the `CredentialStore` port from the `core` crate.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use async_trait::async_trait;
use classmate_core::domain::{Role, UserCredentials};
use classmate_core::ports::{CredentialStore, PortError, PortResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

#[derive(Deserialize)]
struct CredentialEntry {
    password: String,
    role: Role,
}

/// A credential store backed by a JSON file, re-read on every lookup.
#[derive(Clone)]
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn find_user(&self, username: &str) -> PortResult<Option<UserCredentials>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PortError::Unexpected(format!(
                "Failed to read credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let mut users: HashMap<String, CredentialEntry> = serde_json::from_str(&raw)
            .map_err(|e| PortError::Unexpected(format!("Malformed credential file: {}", e)))?;

        Ok(users.remove(username).map(|entry| UserCredentials {
            username: username.to_string(),
            password: entry.password,
            role: entry.role,
        }))
    }

    /// Stored passwords are plaintext, or an argon2 PHC string (`$argon2id$...`).
    fn verify_password(&self, credentials: &UserCredentials, password: &str) -> bool {
        if credentials.password.starts_with("$argon2") {
            match PasswordHash::new(&credentials.password) {
                Ok(parsed_hash) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
                Err(e) => {
                    warn!(
                        "Unparseable password hash for user {}: {:?}",
                        credentials.username, e
                    );
                    false
                }
            }
        } else {
            credentials.password == password
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    fn write_users(dir: &tempfile::TempDir, json: &str) -> JsonCredentialStore {
        let path = dir.path().join("users.json");
        std::fs::write(&path, json).unwrap();
        JsonCredentialStore::new(path)
    }

    #[tokio::test]
    async fn finds_users_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = write_users(
            &dir,
            r#"{"alice": {"password": "pw1", "role": "student"},
                "prof": {"password": "pw2", "role": "staff"}}"#,
        );

        let prof = store.find_user("prof").await.unwrap().unwrap();
        assert_eq!(prof.role, Role::Staff);
        assert!(store.verify_password(&prof, "pw2"));
        assert!(!store.verify_password(&prof, "pw1"));

        assert!(store.find_user("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn argon2_hashes_are_verified() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"s3cret", &salt)
            .unwrap()
            .to_string();
        let dir = tempfile::tempdir().unwrap();
        let store = write_users(
            &dir,
            &serde_json::json!({"bob": {"password": hash, "role": "student"}}).to_string(),
        );

        let bob = store.find_user("bob").await.unwrap().unwrap();
        assert!(store.verify_password(&bob, "s3cret"));
        assert!(!store.verify_password(&bob, "wrong"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCredentialStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.find_user("anyone").await,
            Err(PortError::Unexpected(_))
        ));
    }
}
