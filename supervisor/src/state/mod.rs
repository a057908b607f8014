//! Supervisor conversation state and its merge rule.
//!
//! Nodes return a partial `SupervisorState` holding only what they add;
//! [`SupervisorStateUpdater`] appends `messages` and `intermediate_steps` and
//! overwrites `decision` when the update sets one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channels::StateUpdater;
use crate::error::ClassificationError;
use crate::message::Message;

/// Closed classification produced by the supervisor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Answer the user directly.
    Respond,
    /// Ask the user a clarifying question.
    Clarify,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Respond => "respond",
            Decision::Clarify => "clarify",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the two labels; anything else is a `ClassificationError`.
impl FromStr for Decision {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "respond" => Ok(Decision::Respond),
            "clarify" => Ok(Decision::Clarify),
            other => Err(ClassificationError {
                label: other.to_string(),
            }),
        }
    }
}

/// Audit record for one classifier invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierStep {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// State flowing through the supervisor graph for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisorState {
    /// Append-only conversation history.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Unset until the supervisor node runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    /// Append-only, one entry per classifier call.
    #[serde(default)]
    pub intermediate_steps: Vec<ClassifierStep>,
}

impl SupervisorState {
    /// Fresh state holding the given history.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Partial update that only appends `message`.
    pub fn append_message(message: Message) -> Self {
        Self::from_messages(vec![message])
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Append/overwrite merge for [`SupervisorState`] partial updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorStateUpdater;

impl StateUpdater<SupervisorState> for SupervisorStateUpdater {
    fn apply_update(&self, current: &mut SupervisorState, update: &SupervisorState) {
        current.messages.extend(update.messages.iter().cloned());
        if let Some(decision) = update.decision {
            current.decision = Some(decision);
        }
        current
            .intermediate_steps
            .extend(update.intermediate_steps.iter().cloned());
    }
}
