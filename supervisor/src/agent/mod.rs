//! Supervisor agent: classify the latest turn, then respond or ask for clarification.
//!
//! ```text
//! START → supervisor ─┬─ respond → generate_response ──────→ END
//!                     └─ clarify → generate_clarification ─→ END
//! ```

mod build;
mod clarify_node;
mod classify_node;
mod payload;
mod respond_node;
mod router;

pub use build::{build_supervisor_graph, SupervisorGraph, SupervisorLlms};
pub use clarify_node::ClarifyNode;
pub use classify_node::{parse_classifier_reply, ClassifyNode};
pub use payload::{InvocationRequest, InvocationResponse};
pub use respond_node::{RespondNode, DEFAULT_ADDRESSEE, NAME_KEY};
pub use router::{route, CLARIFY_NODE, RESPOND_NODE, SUPERVISOR_NODE};

use crate::message::Message;

/// System prompt first, then the conversation history.
pub(crate) fn with_system_prompt(prompt: impl Into<String>, history: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(history.len() + 1);
    out.push(Message::system(prompt));
    out.extend(history.iter().cloned());
    out
}
