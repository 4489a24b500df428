//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the generative-answer LLM.
//! It implements the `GenerativeTextService` port from the `core` crate against
//! any OpenAI-compatible chat-completions endpoint (Gemini by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, FinishReason,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use classmate_core::ports::{GenerationFailure, GenerativeTextService};
use std::time::Duration;
use tracing::{error, info, warn};

/// Builds a client that never re-sends a request.
///
/// A rate-limited or failed call reaches the caller on the first response.
pub fn build_client(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config).with_backoff(no_retry)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeTextService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Sorts client errors into the categories shown to the user.
pub fn classify_error(e: OpenAIError) -> GenerationFailure {
    match e {
        OpenAIError::ApiError(api_error) => GenerationFailure::Api(api_error.message),
        OpenAIError::Reqwest(e) if e.status().map(|s| s.as_u16()) == Some(429) => {
            GenerationFailure::Api(e.to_string())
        }
        other => GenerationFailure::Other(other.to_string()),
    }
}

//=========================================================================================
// `GenerativeTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeTextService for OpenAiTextAdapter {
    /// Sends the prompt as a single user message and returns the first choice's text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| GenerationFailure::Other(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| GenerationFailure::Other(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("LLM request to model {} failed: {}", self.model, e);
            classify_error(e)
        })?;

        let Some(choice) = response.choices.into_iter().next() else {
            warn!("LLM returned no choices.");
            return Err(GenerationFailure::EmptyResponse);
        };
        if choice.finish_reason == Some(FinishReason::ContentFilter) {
            warn!("LLM response was blocked by the content filter.");
            return Err(GenerationFailure::EmptyResponse);
        }

        let text = choice.message.content.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            warn!("LLM response contained no text content.");
            return Err(GenerationFailure::EmptyResponse);
        }
        info!("LLM answered with {} characters.", text.len());
        Ok(text)
    }
}
