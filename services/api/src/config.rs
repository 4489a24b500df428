//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use classmate_core::AnswerPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How the login token travels between requests and where sessions live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginPersistence {
    /// `session` cookie, sessions kept in memory.
    Cookie,
    /// `?session=` query parameter, sessions kept in memory.
    QueryParam,
    /// `session` cookie, sessions persisted to `SESSION_FILE`.
    SessionFile,
}

impl FromStr for LoginPersistence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(LoginPersistence::Cookie),
            "query" | "query_param" => Ok(LoginPersistence::QueryParam),
            "session_file" | "file" => Ok(LoginPersistence::SessionFile),
            other => Err(format!("'{}' is not a valid login persistence strategy", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub archive_root: PathBuf,
    pub chat_history_dir: PathBuf,
    pub users_file: PathBuf,
    pub session_file: PathBuf,
    pub login_persistence: LoginPersistence,
    pub answer_policy: AnswerPolicy,
    pub llm_api_key: Option<String>,
    pub llm_api_base: String,
    pub qa_model: String,
    pub note_model: String,
    pub max_upload_bytes: usize,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Storage Locations ---
        let archive_root = path_var("ARCHIVE_ROOT", "cloud_storage");
        let chat_history_dir = path_var("CHAT_HISTORY_DIR", "chat_history");
        let users_file = path_var("USERS_FILE", "users.json");
        let session_file = path_var("SESSION_FILE", "sessions.json");

        // --- Load Feature Switches ---
        let login_persistence = parsed_var("LOGIN_PERSISTENCE", LoginPersistence::Cookie)?;
        let answer_policy = parsed_var("ANSWER_POLICY", AnswerPolicy::Blended)?;

        // --- Load API Keys (as optional) ---
        let llm_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GEMI_API_KEY"))
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();

        // --- Load Adapter-specific Settings ---
        let llm_api_base =
            std::env::var("LLM_API_BASE").unwrap_or_else(|_| DEFAULT_LLM_API_BASE.to_string());
        let qa_model =
            std::env::var("QA_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let note_model =
            std::env::var("NOTE_MODEL").unwrap_or_else(|_| qa_model.clone());

        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            log_level,
            archive_root,
            chat_history_dir,
            users_file,
            session_file,
            login_persistence,
            answer_policy,
            llm_api_key,
            llm_api_base,
            qa_model,
            note_model,
            max_upload_bytes,
            allowed_origin,
        })
    }

    /// A configuration rooted in `data_dir`, used by tests and local tooling.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: Level::INFO,
            archive_root: data_dir.join("cloud_storage"),
            chat_history_dir: data_dir.join("chat_history"),
            users_file: data_dir.join("users.json"),
            session_file: data_dir.join("sessions.json"),
            login_persistence: LoginPersistence::Cookie,
            answer_policy: AnswerPolicy::Blended,
            llm_api_key: None,
            llm_api_base: DEFAULT_LLM_API_BASE.to_string(),
            qa_model: "gemini-2.5-flash".to_string(),
            note_model: "gemini-2.5-flash".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parsed_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e)),
        Err(_) => Ok(default),
    }
}
