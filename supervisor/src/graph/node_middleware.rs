//! Node middleware: wrap node execution with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::AgentError;

use super::Next;

/// The wrapped node call handed to [`NodeMiddleware::around_run`].
pub type NodeRunFn<S> = Box<
    dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> + Send,
>;

/// Async middleware around every node run.
///
/// Implementations must call `inner` to execute the node; they may inspect or
/// transform the state and the result.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError>;
}
