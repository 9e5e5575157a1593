//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the text-generating LLM.
//! It implements the `GenerationService` port from the `core` crate against any
//! OpenAI-compatible chat-completions endpoint (Gemini included).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use learning_path_core::ports::{GenerationService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You are an expert educator who designs learning material. \
Follow the requested output format exactly.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    /// Sends the rendered prompt as a single user turn and returns the first choice's text.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::Unavailable("Generation LLM returned no choices in its response.".to_string())
        })?;
        choice.message.content.ok_or_else(|| {
            PortError::Unavailable("Generation LLM response contained no text content.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter_for(server: &MockServer) -> OpenAiGenerationAdapter {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base(server.uri());
        OpenAiGenerationAdapter::new(Client::with_config(config), "gemini-1.5-flash".to_string())
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gemini-1.5-flash",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn returns_the_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": "gemini-1.5-flash" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion(json!("{\"questions\": []}"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = adapter_for(&server).generate("Generate questions").await.unwrap();
        assert_eq!(text, "{\"questions\": []}");
    }

    #[tokio::test]
    async fn missing_content_is_reported_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(null))))
            .mount(&server)
            .await;

        let err = adapter_for(&server).generate("anything").await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }

    #[tokio::test]
    async fn upstream_errors_are_reported_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "API key not valid",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": null
                }
            })))
            .mount(&server)
            .await;

        let err = adapter_for(&server).generate("anything").await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(message) if message.contains("API key not valid")));
    }
}
