//! Supervisor node: classify the conversation as `respond` or `clarify`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{AgentError, ParseError};
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::{SUPERVISOR_PROMPT, SUPERVISOR_REPAIR_PROMPT};
use crate::state::{ClassifierStep, Decision, SupervisorState};

use super::router::SUPERVISOR_NODE;
use super::with_system_prompt;

/// Parses one classifier reply into an audit record.
///
/// Accepts a bare JSON object or one wrapped in a markdown code fence. Fails with
/// `ParseError` unless the reply is an object with a string `decision`, and with
/// `ClassificationError` when that string is not `respond` or `clarify`.
pub fn parse_classifier_reply(raw: &str) -> Result<ClassifierStep, AgentError> {
    let parse_error = |reason: &str| ParseError {
        reason: reason.to_string(),
        raw: raw.to_string(),
    };

    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| parse_error(&format!("invalid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| parse_error("expected a JSON object"))?;
    let label = match object.get("decision") {
        Some(Value::String(label)) => label,
        Some(_) => return Err(parse_error("`decision` must be a string").into()),
        None => return Err(parse_error("missing `decision` key").into()),
    };
    let decision: Decision = label.parse()?;
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ClassifierStep {
        decision,
        reasoning,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Classifier node.
///
/// Sends the supervisor prompt plus full history; writes `decision` and one
/// `intermediate_steps` entry. Parse failures are returned to the caller unless
/// repair attempts are configured, in which case the model is asked again.
pub struct ClassifyNode {
    llm: Arc<dyn LlmClient>,
    repair_attempts: usize,
}

impl ClassifyNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            repair_attempts: 0,
        }
    }

    /// Extra model calls allowed after a `ParseError` (default 0).
    pub fn with_repair_attempts(mut self, attempts: usize) -> Self {
        self.repair_attempts = attempts;
        self
    }
}

#[async_trait]
impl Node<SupervisorState> for ClassifyNode {
    fn id(&self) -> &str {
        SUPERVISOR_NODE
    }

    async fn run(&self, state: SupervisorState) -> Result<(SupervisorState, Next), AgentError> {
        let mut request = with_system_prompt(SUPERVISOR_PROMPT, &state.messages);
        let mut attempt = 0;
        loop {
            let reply = self.llm.invoke(&request).await?;
            match parse_classifier_reply(&reply.content) {
                Ok(step) => {
                    info!(decision = %step.decision, attempt, "supervisor decision");
                    let update = SupervisorState {
                        messages: Vec::new(),
                        decision: Some(step.decision),
                        intermediate_steps: vec![step],
                    };
                    return Ok((update, Next::Continue));
                }
                Err(AgentError::Parse(e)) if attempt < self.repair_attempts => {
                    attempt += 1;
                    warn!(reason = %e.reason, attempt, "classifier reply unparsable, asking again");
                    request.push(Message::assistant(reply.content));
                    request.push(Message::user(SUPERVISOR_REPAIR_PROMPT));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    #[test]
    fn parses_decision_and_reasoning() {
        let step =
            parse_classifier_reply(r#"{"decision":"clarify","reasoning":"ambiguous"}"#).unwrap();
        assert_eq!(step.decision, Decision::Clarify);
        assert_eq!(step.reasoning.as_deref(), Some("ambiguous"));
    }

    #[test]
    fn parses_fenced_reply() {
        let step = parse_classifier_reply("```json\n{\"decision\": \"respond\"}\n```").unwrap();
        assert_eq!(step.decision, Decision::Respond);
        assert!(step.reasoning.is_none());
    }

    #[test]
    fn missing_decision_is_parse_error() {
        let err = parse_classifier_reply(r#"{"reasoning":"no label"}"#).unwrap_err();
        match err {
            AgentError::Parse(e) => assert!(e.reason.contains("decision")),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn non_json_is_parse_error() {
        let err = parse_classifier_reply("I think we should respond.").unwrap_err();
        assert!(matches!(err, AgentError::Parse(ref e) if e.raw == "I think we should respond."));
    }

    #[test]
    fn array_and_non_string_label_are_parse_errors() {
        assert!(matches!(
            parse_classifier_reply(r#"["respond"]"#),
            Err(AgentError::Parse(_))
        ));
        assert!(matches!(
            parse_classifier_reply(r#"{"decision": 1}"#),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn unknown_label_is_classification_error() {
        let err = parse_classifier_reply(r#"{"decision":"escalate"}"#).unwrap_err();
        assert!(matches!(err, AgentError::Classification(ref e) if e.label == "escalate"));
    }

    #[tokio::test]
    async fn sends_system_prompt_then_history() {
        let llm = Arc::new(MockLlm::new(r#"{"decision":"respond"}"#));
        let node = ClassifyNode::new(llm.clone());
        let state = SupervisorState::from_messages(vec![Message::user("What's 2+2?")]);
        let (update, next) = node.run(state).await.unwrap();

        assert_eq!(next, Next::Continue);
        assert!(update.messages.is_empty());
        assert_eq!(update.decision, Some(Decision::Respond));
        assert_eq!(update.intermediate_steps.len(), 1);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], Message::system(SUPERVISOR_PROMPT));
        assert_eq!(calls[0][1], Message::user("What's 2+2?"));
    }

    #[tokio::test]
    async fn parse_error_without_repair_makes_one_call() {
        let llm = Arc::new(MockLlm::with_replies(["not json", r#"{"decision":"respond"}"#]));
        let node = ClassifyNode::new(llm.clone());
        let err = node
            .run(SupervisorState::from_messages(vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn repair_asks_again_after_parse_error() {
        let llm = Arc::new(MockLlm::with_replies(["not json", r#"{"decision":"clarify"}"#]));
        let node = ClassifyNode::new(llm.clone()).with_repair_attempts(1);
        let (update, _) = node
            .run(SupervisorState::from_messages(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(update.decision, Some(Decision::Clarify));

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        let retry = &calls[1];
        assert_eq!(retry[retry.len() - 2], Message::assistant("not json"));
        assert_eq!(retry[retry.len() - 1], Message::user(SUPERVISOR_REPAIR_PROMPT));
    }

    #[tokio::test]
    async fn repair_does_not_retry_classification_errors() {
        let llm = Arc::new(MockLlm::with_replies([
            r#"{"decision":"maybe"}"#,
            r#"{"decision":"respond"}"#,
        ]));
        let node = ClassifyNode::new(llm.clone()).with_repair_attempts(3);
        let err = node
            .run(SupervisorState::from_messages(vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Classification(_)));
        assert_eq!(llm.call_count(), 1);
    }
}
