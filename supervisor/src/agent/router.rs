//! Routing after the supervisor node.

use crate::error::InvalidDecisionError;
use crate::state::{Decision, SupervisorState};

pub const SUPERVISOR_NODE: &str = "supervisor";
pub const RESPOND_NODE: &str = "generate_response";
pub const CLARIFY_NODE: &str = "generate_clarification";

/// Maps the decision to the generation node id. Pure; an unset decision is fatal.
pub fn route(state: &SupervisorState) -> Result<&'static str, InvalidDecisionError> {
    match state.decision {
        Some(Decision::Respond) => Ok(RESPOND_NODE),
        Some(Decision::Clarify) => Ok(CLARIFY_NODE),
        None => Err(InvalidDecisionError),
    }
}
