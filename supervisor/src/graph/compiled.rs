//! Compiled state graph: immutable, supports invoke only.
//!
//! Built by `StateGraph::compile`. Holds the nodes, the next-step map derived from
//! plain and conditional edges, the state updater and optional middleware.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::channels::BoxedStateUpdater;
use crate::error::AgentError;
use crate::runnable_config::RunnableConfig;

use super::logging::{
    log_conditional_route, log_graph_complete, log_graph_error, log_graph_start,
    log_node_complete, log_node_start, log_node_state, log_state_update,
};
use super::node_middleware::{NodeMiddleware, NodeRunFn};
use super::state_graph::END;
use super::{Next, NextEntry, Node, RunContext};

/// Node executions allowed per invoke unless overridden with `StateGraph::with_step_limit`.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// Compiled graph: immutable structure, supports invoke only.
///
/// Runs from the node after START. After each node, its output is merged through the
/// state updater; then the conditional router (when present) or the node's `Next`
/// and plain edge choose the next node. Reaching END returns the merged state.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
    pub(super) step_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node ids, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The node run first (target of the START edge).
    pub fn entry_node(&self) -> &str {
        &self.first_node_id
    }

    /// The middleware installed with `StateGraph::with_middleware`, if any.
    pub fn middleware(&self) -> Option<Arc<dyn NodeMiddleware<S>>> {
        self.middleware.clone()
    }

    /// Same graph with `middleware` in the middleware slot; nodes and edges are shared.
    pub fn with_middleware(&self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        let mut graph = self.clone();
        graph.middleware = Some(middleware);
        graph
    }

    async fn execute_node(
        &self,
        node: Arc<dyn Node<S>>,
        state: S,
        ctx: &RunContext,
    ) -> Result<(S, Next), AgentError> {
        match &self.middleware {
            Some(middleware) => {
                let node_id = node.id().to_string();
                let ctx_owned = ctx.clone();
                let inner: NodeRunFn<S> = Box::new(move |s| {
                    let fut: Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> =
                        Box::pin(async move { node.run_with_context(s, &ctx_owned).await });
                    fut
                });
                middleware.around_run(&node_id, state, inner).await
            }
            None => node.run_with_context(state, ctx).await,
        }
    }

    fn resolve_next(&self, current_id: &str, state: &S, next: Next) -> Result<Option<String>, AgentError> {
        match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state)?;
                log_conditional_route(current_id, &target);
                Ok(Some(target))
            }
            entry => Ok(match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => match entry {
                    Some(NextEntry::Unconditional(id)) => Some(id.clone()),
                    _ => None,
                },
            }),
        }
    }

    /// Runs the graph with the given state and optional run configuration.
    ///
    /// Any node or router error stops the run and is returned unchanged; no partial
    /// state is returned in that case.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        let ctx = RunContext::new(config.unwrap_or_default());
        let result = self.run_loop(state, &ctx).await;
        match &result {
            Ok((_, steps)) => log_graph_complete(*steps),
            Err(e) => log_graph_error(e),
        }
        result.map(|(state, _)| state)
    }

    async fn run_loop(&self, mut state: S, ctx: &RunContext) -> Result<(S, usize), AgentError> {
        log_graph_start();
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;

        loop {
            if steps >= self.step_limit {
                return Err(AgentError::ExecutionFailed(format!(
                    "step limit of {} reached before END (at node {})",
                    self.step_limit, current_id
                )));
            }
            let node = self.nodes.get(&current_id).cloned().ok_or_else(|| {
                AgentError::ExecutionFailed(format!("node not found: {}", current_id))
            })?;

            log_node_start(&current_id);
            log_node_state(&current_id, &state);

            let (update, next) = self.execute_node(node, state.clone(), ctx).await?;
            steps += 1;
            log_node_complete(&current_id, &next);

            self.state_updater.apply_update(&mut state, &update);
            log_state_update(&current_id);

            match self.resolve_next(&current_id, &state, next)? {
                Some(id) if id != END => current_id = id,
                _ => return Ok((state, steps)),
            }
        }
    }
}
