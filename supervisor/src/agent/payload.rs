//! Wire payloads accepted and returned by a published supervisor graph.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::state::{ClassifierStep, Decision, SupervisorState};

/// Inbound payload: `{"messages": [{"role": ..., "content": ...}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub messages: Vec<Message>,
}

impl InvocationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// `{"messages":[{"role":"user","content":"Hello"}]}`: the input example stored with
    /// every published artifact.
    pub fn sample() -> Self {
        Self::new(vec![Message::user("Hello")])
    }
}

impl From<InvocationRequest> for SupervisorState {
    fn from(request: InvocationRequest) -> Self {
        SupervisorState::from_messages(request.messages)
    }
}

/// Outbound payload: the final state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub messages: Vec<Message>,
    pub decision: Option<Decision>,
    pub intermediate_steps: Vec<ClassifierStep>,
}

impl From<SupervisorState> for InvocationResponse {
    fn from(state: SupervisorState) -> Self {
        Self {
            messages: state.messages,
            decision: state.decision,
            intermediate_steps: state.intermediate_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_reads_role_content_messages() {
        let request: InvocationRequest =
            serde_json::from_value(json!({"messages":[{"role":"user","content":"What's 2+2?"}]}))
                .unwrap();
        assert_eq!(request.messages, vec![Message::user("What's 2+2?")]);
    }

    #[test]
    fn response_always_carries_decision_key() {
        let response = InvocationResponse::from(SupervisorState::default());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"messages": [], "decision": null, "intermediate_steps": []})
        );
    }
}
