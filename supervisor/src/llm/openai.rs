//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Requires `OPENAI_API_KEY` (or explicit config). The base URL honours
//! `OPENAI_BASE_URL` / `OPENAI_API_BASE` for OpenAI-compatible gateways.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

/// Model used by every supervisor node unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI Chat Completions client.
///
/// **Interaction**: Implements `LlmClient`; used by the supervisor, response and
/// clarification nodes.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(Self::env_config(), model)
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0–2). The supervisor nodes use 0.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn env_config() -> OpenAIConfig {
        let mut config = OpenAIConfig::new();
        if let Some(base) = Self::api_base() {
            config = config.with_api_base(base);
        }
        config
    }

    /// Base from `OPENAI_BASE_URL` or `OPENAI_API_BASE`, with a `/v1` suffix ensured.
    fn api_base() -> Option<String> {
        let base = std::env::var("OPENAI_BASE_URL")
            .or_else(|_| std::env::var("OPENAI_API_BASE"))
            .ok()?;
        let base = base.trim_end_matches('/');
        Some(if base.ends_with("/v1") {
            base.to_string()
        } else {
            format!("{}/v1", base)
        })
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => ChatCompletionRequestMessage::Assistant(s.as_str().into()),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })?;

        debug!(
            trace_id = %trace_id,
            model = %self.model,
            message_count = messages.len(),
            temperature = ?self.temperature,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string(&request) {
            trace!(trace_id = %trace_id, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string(&response) {
            trace!(trace_id = %trace_id, response = %js, "OpenAI response body");
        }

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AgentError::ExecutionFailed("OpenAI returned no choices".to_string())
        })?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}
