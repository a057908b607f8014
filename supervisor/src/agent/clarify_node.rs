//! Clarification node: ask the user a question about their request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::CLARIFICATION_PROMPT;
use crate::state::SupervisorState;

use super::router::CLARIFY_NODE;
use super::with_system_prompt;

pub struct ClarifyNode {
    llm: Arc<dyn LlmClient>,
}

impl ClarifyNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<SupervisorState> for ClarifyNode {
    fn id(&self) -> &str {
        CLARIFY_NODE
    }

    async fn run(&self, state: SupervisorState) -> Result<(SupervisorState, Next), AgentError> {
        let request = with_system_prompt(CLARIFICATION_PROMPT, &state.messages);
        let reply = self.llm.invoke(&request).await?;
        Ok((
            SupervisorState::append_message(Message::assistant(reply.content)),
            Next::Continue,
        ))
    }
}
