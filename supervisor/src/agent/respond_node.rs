//! Response node: answer the user, addressing them by the configured name.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::response_prompt;
use crate::state::SupervisorState;

use super::router::RESPOND_NODE;
use super::with_system_prompt;

/// `RunnableConfig` key holding the addressee name.
pub const NAME_KEY: &str = "name";

/// Addressee used when the configuration has no `name`.
pub const DEFAULT_ADDRESSEE: &str = "user";

pub struct RespondNode {
    llm: Arc<dyn LlmClient>,
}

impl RespondNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    async fn respond(&self, state: &SupervisorState, name: &str) -> Result<SupervisorState, AgentError> {
        let request = with_system_prompt(response_prompt(name), &state.messages);
        let reply = self.llm.invoke(&request).await?;
        tracing::debug!(name, chars = reply.content.len(), "generated response");
        Ok(SupervisorState::append_message(Message::assistant(reply.content)))
    }
}

#[async_trait]
impl Node<SupervisorState> for RespondNode {
    fn id(&self) -> &str {
        RESPOND_NODE
    }

    async fn run(&self, state: SupervisorState) -> Result<(SupervisorState, Next), AgentError> {
        let update = self.respond(&state, DEFAULT_ADDRESSEE).await?;
        Ok((update, Next::Continue))
    }

    async fn run_with_context(
        &self,
        state: SupervisorState,
        ctx: &RunContext,
    ) -> Result<(SupervisorState, Next), AgentError> {
        let name = ctx.config.get_str(NAME_KEY).unwrap_or(DEFAULT_ADDRESSEE);
        let update = self.respond(&state, name).await?;
        Ok((update, Next::Continue))
    }
}
