//! LLM client abstraction used by the supervisor nodes.
//!
//! Each node sends a system prompt plus the conversation history and reads back the
//! assistant text. `ChatOpenAI` talks to an OpenAI-compatible API; `MockLlm` replays
//! scripted replies and records the prompts it was given.

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::{ChatOpenAI, DEFAULT_MODEL};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text.
///
/// One blocking round trip per call; no retry or timeout policy beyond the implementation's.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}
