//! Shared harness for the API integration tests: a temp data directory, a
//! credential file, fake LLMs and helpers to drive the router with `oneshot`.
#![allow(dead_code)]

use api_lib::config::{Config, LoginPersistence};
use api_lib::web::{create_router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use classmate_core::ports::{GenerationFailure, GenerativeTextService};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const USERS_JSON: &str = r#"{
  "alice": { "password": "wonderland", "role": "student" },
  "prof": { "password": "chalk", "role": "staff" }
}"#;

//=========================================================================================
// Fake LLM
//=========================================================================================

/// Always gives the same reply and records every prompt it receives.
pub struct FakeLlm {
    reply: Result<String, GenerationFailure>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: GenerationFailure) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(failure),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeTextService for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

//=========================================================================================
// Test application
//=========================================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub config: Arc<Config>,
    pub router: Router,
    pub qa_llm: Arc<FakeLlm>,
    pub notes_llm: Arc<FakeLlm>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            FakeLlm::replying("Binary search halves the search range each step."),
            FakeLlm::replying("Overview of the lecture.\n- First point\n- Second point"),
            |_| {},
        )
    }

    pub fn with_persistence(persistence: LoginPersistence) -> Self {
        Self::with(
            FakeLlm::replying("An answer."),
            FakeLlm::replying("- A note"),
            |config| config.login_persistence = persistence,
        )
    }

    pub fn with(
        qa_llm: Arc<FakeLlm>,
        notes_llm: Arc<FakeLlm>,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_data_dir(dir.path());
        configure(&mut config);
        std::fs::write(&config.users_file, USERS_JSON).unwrap();

        let config = Arc::new(config);
        let state = AppState::from_config(config.clone(), qa_llm.clone(), notes_llm.clone());
        let router = create_router(Arc::new(state)).unwrap();

        Self {
            dir,
            config,
            router,
            qa_llm,
            notes_llm,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// A request carrying the login `token` as a cookie.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(body).unwrap()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(self.request(Method::GET, path, token, None, Body::empty()))
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(self.request(Method::DELETE, path, token, None, Body::empty()))
            .await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(self.request(
            Method::POST,
            path,
            token,
            Some("application/json"),
            Body::from(body.to_string()),
        ))
        .await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        token: Option<&str>,
        parts: &[Part<'_>],
    ) -> TestResponse {
        let (content_type, body) = multipart_body(parts);
        self.send(self.request(
            Method::POST,
            path,
            token,
            Some(&content_type),
            Body::from(body),
        ))
        .await
    }

    pub async fn try_login(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/auth/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Logs in and returns the session token from the cookie (or the body in query mode).
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.try_login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        match response.header(header::SET_COOKIE) {
            Some(cookie) => session_token_from_cookie(&cookie),
            None => response.json()["session_token"].as_str().unwrap().to_string(),
        }
    }
}

pub fn session_token_from_cookie(cookie: &str) -> String {
    cookie
        .split(';')
        .next()
        .and_then(|pair| pair.trim().strip_prefix("session="))
        .unwrap()
        .to_string()
}

/// Every file below `root`, relative to it, sorted.
pub fn tree(root: &std::path::Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}

//=========================================================================================
// Multipart bodies
//=========================================================================================

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        bytes: &'a [u8],
    },
}

const BOUNDARY: &str = "classmate-test-boundary";

pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        match part {
            Part::Text(name, value) => {
                body.extend(
                    format!(
                        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        BOUNDARY, name, value
                    )
                    .into_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                bytes,
            } => {
                body.extend(
                    format!(
                        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        BOUNDARY, name, file_name
                    )
                    .into_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend(format!("--{}--\r\n", BOUNDARY).into_bytes());
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// The standard staff upload form, with `file` as the lecture content.
pub fn lecture_parts<'a>(topic: &'a str, file_name: &'a str, bytes: &'a [u8]) -> Vec<Part<'a>> {
    vec![
        Part::Text("subject", "AI & ML!!"),
        Part::Text("unit", "Unit 1"),
        Part::Text("topic", topic),
        Part::Text("date", "2025-03-14"),
        Part::Text("time", "09:30"),
        Part::File {
            name: "file",
            file_name,
            bytes,
        },
    ]
}
