//! Graph node trait: one step in a StateGraph.
//!
//! Receives the full state, returns a state value for the graph's `StateUpdater` to
//! merge (a partial update when the updater appends) plus `Next`.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::{Next, RunContext};

/// One step in a graph: state in, (update out, next step).
///
/// **Interaction**: registered via `StateGraph::add_node`, driven by
/// `CompiledStateGraph::invoke`, which always calls `run_with_context`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"supervisor"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step without run configuration.
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;

    /// Variant with run context (configuration). Default calls `run`.
    async fn run_with_context(&self, state: S, _ctx: &RunContext) -> Result<(S, Next), AgentError> {
        self.run(state).await
    }
}
