//! Run-time error types for the decision graph.
//!
//! `AgentError` is what nodes, routers and `CompiledStateGraph::invoke` return. The
//! supervisor-specific failures carry their own types so callers can match on them.

use thiserror::Error;

/// Classifier reply was not a JSON object with a string `decision` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("classifier response is not valid structured output: {reason}")]
pub struct ParseError {
    pub reason: String,
    /// The model text that failed to parse.
    pub raw: String,
}

/// Classifier label outside the closed set `{respond, clarify}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("classifier returned unknown decision {label:?} (expected \"respond\" or \"clarify\")")]
pub struct ClassificationError {
    pub label: String,
}

/// Routing attempted while the state holds no decision. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid supervisor decision: routing requires a decision, found none")]
pub struct InvalidDecisionError;

/// Graph execution error.
///
/// Returned by `Node::run`, conditional routers and `CompiledStateGraph::invoke`.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, step limit hit).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    InvalidDecision(#[from] InvalidDecisionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("msg".to_string());
        let s = err.to_string();
        assert!(s.contains("execution failed"), "{}", s);
        assert!(s.contains("msg"), "{}", s);
    }

    /// **Scenario**: Wrapped supervisor errors display their own message unchanged.
    #[test]
    fn wrapped_errors_are_transparent() {
        let err: AgentError = ClassificationError {
            label: "escalate".into(),
        }
        .into();
        assert!(err.to_string().contains("\"escalate\""));

        let err: AgentError = InvalidDecisionError.into();
        assert!(err.to_string().starts_with("invalid supervisor decision"));
    }
}
