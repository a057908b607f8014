//! Mock LLM for tests and offline runs.
//!
//! Replays scripted replies in order (the last one repeats) and records every
//! message list it receives, so tests can assert on prompts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

enum Scripted {
    Reply(String),
    Fail(String),
}

/// Scripted LLM.
///
/// **Interaction**: Implements `LlmClient`; used wherever `ChatOpenAI` would be.
pub struct MockLlm {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Always answers `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_replies([content.into()])
    }

    /// Answers each reply once, in order; the last reply repeats once the script runs out.
    pub fn with_replies<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            script: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| Scripted::Reply(r.into()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `AgentError::ExecutionFailed(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Scripted::Fail(message.into())])),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Message lists received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        let mut script = self
            .script
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock llm lock poisoned".into()))?;
        let entry = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().map(|s| match s {
                Scripted::Reply(r) => Scripted::Reply(r.clone()),
                Scripted::Fail(m) => Scripted::Fail(m.clone()),
            })
        };
        match entry {
            Some(Scripted::Reply(content)) => Ok(LlmResponse::text(content)),
            Some(Scripted::Fail(message)) => Err(AgentError::ExecutionFailed(message)),
            None => Err(AgentError::ExecutionFailed("mock llm has no scripted reply".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_repeats_last() {
        let llm = MockLlm::with_replies(["one", "two"]);
        let msgs = [Message::user("x")];
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "one");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "two");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "two");
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn records_prompts() {
        let llm = MockLlm::new("ok");
        llm.invoke(&[Message::system("sys"), Message::user("hi")])
            .await
            .unwrap();
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], Message::system("sys"));
    }

    #[tokio::test]
    async fn failing_mock_returns_execution_failed() {
        let llm = MockLlm::failing("boom");
        let err = llm.invoke(&[]).await.unwrap_err();
        assert!(matches!(err, AgentError::ExecutionFailed(m) if m == "boom"));
    }

    #[tokio::test]
    async fn empty_script_is_an_error() {
        let llm = MockLlm::with_replies(Vec::<String>::new());
        assert!(llm.invoke(&[]).await.is_err());
    }
}
