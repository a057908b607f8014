//! Shared nodes for the engine tests.

use async_trait::async_trait;
use supervisor::{AgentError, Next, Node};

/// Trail of visited node ids plus a counter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trail {
    pub visited: Vec<String>,
    pub count: u32,
}

/// Appends its id and bumps the counter; returns `next`.
pub struct Visit {
    id: &'static str,
    next: Next,
}

impl Visit {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            next: Next::Continue,
        }
    }

    pub fn with_next(id: &'static str, next: Next) -> Self {
        Self { id, next }
    }
}

#[async_trait]
impl Node<Trail> for Visit {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, mut state: Trail) -> Result<(Trail, Next), AgentError> {
        state.visited.push(self.id.to_string());
        state.count += 1;
        Ok((state, self.next.clone()))
    }
}

pub struct Failing;

#[async_trait]
impl Node<Trail> for Failing {
    fn id(&self) -> &str {
        "failing"
    }

    async fn run(&self, _state: Trail) -> Result<(Trail, Next), AgentError> {
        Err(AgentError::ExecutionFailed("always fails".into()))
    }
}
