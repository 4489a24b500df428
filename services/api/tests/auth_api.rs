//! Integration tests for login, logout and the per-request session context.

mod common;

use api_lib::config::LoginPersistence;
use axum::http::{header, StatusCode};
use common::TestApp;

#[tokio::test]
async fn login_sets_a_session_cookie() {
    let app = TestApp::new();

    let response = app.try_login("prof", "chalk").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["username"], "prof");
    assert_eq!(body["role"], "staff");
    assert!(body.get("session_token").is_none());

    let cookie = response.header(header::SET_COOKIE).unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn failed_logins_change_nothing() {
    let app = TestApp::new();
    let before = std::fs::read(&app.config.users_file).unwrap();

    let attempts = [
        ("alice", "wrong"),
        ("mallory", "wonderland"),
        ("Alice", "wonderland"),
    ];
    for (username, password) in attempts {
        let response = app.try_login(username, password).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Invalid credentials");
        assert!(response.header(header::SET_COOKIE).is_none());
    }

    assert_eq!(std::fs::read(&app.config.users_file).unwrap(), before);
    assert!(!app.config.session_file.exists());
}

#[tokio::test]
async fn protected_routes_need_a_valid_session() {
    let app = TestApp::new();

    assert_eq!(app.get("/lectures", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/lectures", Some("not-a-token")).await.status,
        StatusCode::UNAUTHORIZED
    );

    let token = app.login("alice", "wonderland").await;
    assert_eq!(app.get("/lectures", Some(&token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let response = app
        .post_json("/auth/logout", Some(&token), serde_json::json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header(header::SET_COOKIE).unwrap().contains("Max-Age=0"));

    assert_eq!(
        app.get("/conversations", Some(&token)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn query_strategy_returns_the_token_in_the_body() {
    let app = TestApp::with_persistence(LoginPersistence::QueryParam);

    let response = app.try_login("alice", "wonderland").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header(header::SET_COOKIE).is_none());
    let token = response.json()["session_token"].as_str().unwrap().to_string();

    let listed = app.get(&format!("/lectures?session={}", token), None).await;
    assert_eq!(listed.status, StatusCode::OK);

    // Cookies are not consulted in this mode.
    assert_eq!(
        app.get("/lectures", Some(&token)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn session_file_strategy_persists_sessions() {
    let app = TestApp::with_persistence(LoginPersistence::SessionFile);
    let token = app.login("prof", "chalk").await;

    let saved = std::fs::read_to_string(&app.config.session_file).unwrap();
    assert!(saved.contains(&token));
    assert_eq!(app.get("/lectures", Some(&token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn session_context_resolves_pages_by_role() {
    let app = TestApp::new();

    let anonymous = app.get("/session?page=ai_chat", None).await.json();
    assert_eq!(anonymous["logged_in"], false);
    assert_eq!(anonymous["current_page"], "auth");
    assert_eq!(anonymous["menu"], serde_json::json!([]));

    let student = app.login("alice", "wonderland").await;
    let view = app
        .get("/session?page=upload_lecture", Some(&student))
        .await
        .json();
    assert_eq!(view["user"], "alice");
    assert_eq!(view["role"], "student");
    assert_eq!(view["current_page"], "view_lectures");
    assert_eq!(view["menu"], serde_json::json!(["view_lectures", "ai_chat"]));

    let staff = app.login("prof", "chalk").await;
    let view = app.get("/session", Some(&staff)).await.json();
    assert_eq!(view["current_page"], "upload_lecture");
    assert_eq!(
        view["menu"],
        serde_json::json!(["upload_lecture", "view_lectures", "ai_chat"])
    );
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}
