//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{llm::build_client, OpenAiTextAdapter},
    config::Config,
    error::ApiError,
    web::{create_router, rest::ApiDoc, state::AppState},
};
use async_openai::config::OpenAIConfig;
use axum::Router;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Prepare Storage ---
    tokio::fs::create_dir_all(&config.archive_root).await?;
    tokio::fs::create_dir_all(&config.chat_history_dir).await?;
    info!(
        "Lecture archive at {}, chat history at {}",
        config.archive_root.display(),
        config.chat_history_dir.display()
    );

    // --- 3. Initialize Service Adapters ---
    let llm_config = OpenAIConfig::new()
        .with_api_key(config.llm_api_key.as_ref().ok_or_else(|| {
            ApiError::Internal("GEMINI_API_KEY (or OPENAI_API_KEY) is required".to_string())
        })?)
        .with_api_base(&config.llm_api_base);
    let llm_client = build_client(llm_config);

    let qa_adapter = Arc::new(OpenAiTextAdapter::new(
        llm_client.clone(),
        config.qa_model.clone(),
    ));
    let notes_adapter = Arc::new(OpenAiTextAdapter::new(
        llm_client,
        config.note_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::from_config(
        config.clone(),
        qa_adapter,
        notes_adapter,
    ));
    info!(
        "Login persistence: {:?}, answer policy: {:?}",
        config.login_persistence,
        app_state.answer_router.policy()
    );

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(create_router(app_state)?)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
