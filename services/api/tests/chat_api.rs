//! Integration tests for the AI chat: routing labels, failures and saved conversations.

mod common;

use api_lib::adapters::notes_render::render_docx;
use axum::http::StatusCode;
use chrono::NaiveDate;
use classmate_core::domain::NotesDocument;
use classmate_core::ports::GenerationFailure;
use common::{lecture_parts, FakeLlm, Part, TestApp};
use serde_json::json;

fn syllabus_docx() -> Vec<u8> {
    render_docx(&NotesDocument {
        title: "Syllabus".into(),
        subject: "Algorithms".into(),
        date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        notes: "Week 1: asymptotic analysis\nWeek 2: divide and conquer".into(),
    })
    .unwrap()
}

#[tokio::test]
async fn greetings_never_reach_the_model() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let response = app
        .post_json("/chat", Some(&token), json!({ "question": "  Good Morning " }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["source"], "system");
    assert_eq!(body["source_caption"], "🤖 System Response");
    assert!(body["answer"].as_str().unwrap().starts_with("Hello!"));
    assert_eq!(app.qa_llm.calls(), 0);
}

#[tokio::test]
async fn without_lectures_answers_are_external() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let body = app
        .post_json("/chat", Some(&token), json!({ "question": "What is binary search?" }))
        .await
        .json();
    assert_eq!(body["source"], "external");
    assert_eq!(body["answer"], "Binary search halves the search range each step.");

    assert_eq!(app.qa_llm.calls(), 1);
    let prompt = app.qa_llm.last_prompt();
    assert!(prompt.contains("CLASSROOM LECTURE CONTENT:"));
    assert!(!prompt.contains("No lectures uploaded yet."));
    assert!(prompt.contains("What is binary search?"));
}

#[tokio::test]
async fn uploaded_lectures_ground_the_answer() {
    let app = TestApp::new();
    let staff = app.login("prof", "chalk").await;
    app.post_multipart(
        "/lectures",
        Some(&staff),
        &lecture_parts("Search Trees", "clip.mp4", b"fake-video"),
    )
    .await;

    let body = app
        .post_json("/chat", Some(&staff), json!({ "question": "What are search trees?" }))
        .await
        .json();
    assert_eq!(body["source"], "lectures");
    assert_eq!(body["source_caption"], "📘 Source: Classroom Lectures");

    let prompt = app.qa_llm.last_prompt();
    assert!(prompt.contains("--- AI_ML_Unit_1_Search_Trees_09-30.txt ---"));
    assert!(prompt.contains("This lecture covers Search_Trees"));
}

#[tokio::test]
async fn an_attached_document_takes_the_label() {
    let app = TestApp::new();
    let staff = app.login("prof", "chalk").await;
    app.post_multipart(
        "/lectures",
        Some(&staff),
        &lecture_parts("Search Trees", "clip.mp4", b"fake-video"),
    )
    .await;

    let docx = syllabus_docx();
    let attached = app
        .post_multipart(
            "/chat/document",
            Some(&staff),
            &[Part::File {
                name: "file",
                file_name: "syllabus.docx",
                bytes: &docx,
            }],
        )
        .await;
    assert_eq!(attached.status, StatusCode::OK, "{}", attached.text());

    let body = app
        .post_json("/chat", Some(&staff), json!({ "question": "What is in week 2?" }))
        .await
        .json();
    assert_eq!(body["source"], "document");

    let prompt = app.qa_llm.last_prompt();
    let document_at = prompt.find("UPLOADED DOCUMENT (syllabus.docx):").unwrap();
    let lectures_at = prompt.find("CLASSROOM LECTURE CONTENT:").unwrap();
    assert!(document_at < lectures_at);
    assert!(prompt.contains("Week 2: divide and conquer"));
}

#[tokio::test]
async fn model_failures_come_back_as_answers() {
    let app = TestApp::with(
        FakeLlm::failing(GenerationFailure::EmptyResponse),
        FakeLlm::replying("- unused"),
        |_| {},
    );
    let token = app.login("alice", "wonderland").await;

    let response = app
        .post_json("/chat", Some(&token), json!({ "question": "Explain heaps" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["answer"],
        GenerationFailure::EmptyResponse.to_string()
    );
}

#[tokio::test]
async fn conversations_are_saved_after_each_turn() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let first = app
        .post_json("/chat", Some(&token), json!({ "question": "What is a heap?" }))
        .await
        .json();
    let id = first["conversation_id"].as_str().unwrap().to_string();

    // Without an id the question continues the current conversation.
    let second = app
        .post_json("/chat", Some(&token), json!({ "question": "hi" }))
        .await
        .json();
    assert_eq!(second["conversation_id"], id.as_str());

    let path = app
        .config
        .chat_history_dir
        .join("alice/conversations")
        .join(format!("{}.json", id));
    assert!(path.exists());

    let conversation = app
        .get(&format!("/conversations/{}", id), Some(&token))
        .await
        .json();
    assert_eq!(conversation["title"], "What is a heap?");
    let messages = conversation["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert!(messages[0].get("source").is_none());
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["source"], "external");
    assert_eq!(messages[3]["source"], "system");

    let listed = app.get("/conversations", Some(&token)).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(listed[0]["message_count"], 4);
}

#[tokio::test]
async fn new_conversations_become_current() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let old = app
        .post_json("/chat", Some(&token), json!({ "question": "First topic" }))
        .await
        .json();

    let created = app.post_json("/conversations", Some(&token), json!({})).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let created = created.json();
    assert_eq!(created["title"], "New Chat");

    let answer = app
        .post_json("/chat", Some(&token), json!({ "question": "Second topic" }))
        .await
        .json();
    assert_eq!(answer["conversation_id"], created["id"]);
    assert_ne!(answer["conversation_id"], old["conversation_id"]);

    // Other users never see these conversations.
    let other = app.login("prof", "chalk").await;
    let listed = app.get("/conversations", Some(&other)).await.json();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn bad_chat_requests_are_rejected() {
    let app = TestApp::new();
    let token = app.login("alice", "wonderland").await;

    let blank = app
        .post_json("/chat", Some(&token), json!({ "question": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post_json(
            "/chat",
            Some(&token),
            json!({ "question": "Hello there", "conversation_id": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(app.qa_llm.calls(), 0);
}
