//! Conversation message: `{role, content}` with role `system`, `user` or `assistant`.
//!
//! Serialises in exactly that wire shape, so inbound payloads deserialize directly.

use serde::{Deserialize, Serialize};

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    /// System prompt; placed first when a node builds a model request.
    System(String),
    /// User input.
    User(String),
    /// Model reply.
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::User(_) => "user",
            Self::Assistant(_) => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System(c) | Self::User(c) | Self::Assistant(c) => c,
        }
    }
}
