//! Middleware that records node enter/exit and duration around each node run.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Instant;

use crate::error::AgentError;

use super::node_middleware::NodeRunFn;
use super::{Next, NodeMiddleware};

/// Emits `tracing` events when a node is entered and left.
///
/// Generic over state type `S`; only the node id, outcome and elapsed time are logged.
pub struct LoggingNodeMiddleware<S> {
    _phantom: std::marker::PhantomData<fn() -> S>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError> {
        tracing::debug!(node_id, "enter node");
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok((_, next)) => tracing::debug!(node_id, ?next, elapsed_ms, "exit node"),
            Err(e) => tracing::warn!(node_id, error = %e, elapsed_ms, "node failed"),
        }
        result
    }
}
