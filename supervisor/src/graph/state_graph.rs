//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define the chain with `add_edge(from, to)` using
//! `START` and `END` for graph entry/exit. Use `add_conditional_edges` to route
//! to the next node based on state. Then `compile` to get a `CompiledStateGraph`.
//!
//! # State Updates
//!
//! By default, nodes return a new state that completely replaces the previous state.
//! To append instead (e.g. message history), use `with_state_updater`.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::{BoxedStateUpdater, ReplaceUpdater};
use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, DEFAULT_STEP_LIMIT};
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph builder, generic over state type `S`.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces an immutable `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Edges (from_id, to_id). A node may have one outgoing edge or conditional_edges, not both.
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    state_updater: Option<BoxedStateUpdater<S>>,
    step_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            middleware: None,
            state_updater: None,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Attaches node middleware; every node run is wrapped by it.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Attaches a custom state updater (default: `ReplaceUpdater`).
    pub fn with_state_updater(self, updater: BoxedStateUpdater<S>) -> Self {
        Self {
            state_updater: Some(updater),
            ..self
        }
    }

    /// Maximum node executions per invoke before the run fails.
    pub fn with_step_limit(self, step_limit: usize) -> Self {
        Self { step_limit, ..self }
    }

    /// Adds a node; replaces any node with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id` (`START` / `END` allowed).
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: next node is determined by `path(state)`.
    ///
    /// After the source node runs and its output is merged, `path` is called with the
    /// state; its key is the next node id, or is looked up in `path_map` when provided.
    /// The source must not also have an `add_edge`.
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "supervisor",
    ///     Arc::new(|s: &SupervisorState| route(s).map(str::to_string).map_err(AgentError::from)),
    ///     None,
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph after validating edges.
    ///
    /// Returns `CompilationError` if any edge references an unknown node, there is not
    /// exactly one edge from START, nothing reaches END, a node has two plain edges, or
    /// a node has both a plain and a conditional edge.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(ref path_map) = router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let mut start_edges = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone());
        let first = match (start_edges.next(), start_edges.next()) {
            (None, _) => return Err(CompilationError::MissingStart),
            (Some(first), None) => first,
            (Some(_), Some(_)) => {
                return Err(CompilationError::InvalidChain(
                    "multiple edges from START (branch)".into(),
                ))
            }
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let mut edge_froms = HashSet::new();
        for (from, _) in self.edges.iter().filter(|(f, _)| f != START) {
            if !edge_froms.insert(from.clone()) {
                return Err(CompilationError::InvalidChain(format!(
                    "duplicate edge from {} (branch)",
                    from
                )));
            }
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = self
            .edges
            .into_iter()
            .filter(|(f, _)| f != START)
            .map(|(f, t)| (f, NextEntry::Unconditional(t)))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        let state_updater = self
            .state_updater
            .unwrap_or_else(|| Arc::new(ReplaceUpdater));

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
            middleware: self.middleware,
            state_updater,
            step_limit: self.step_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::graph::Next;

    #[derive(Clone, Debug)]
    struct Counter(u32);

    struct Bump(&'static str);

    #[async_trait]
    impl Node<Counter> for Bump {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, state: Counter) -> Result<(Counter, Next), AgentError> {
            Ok((Counter(state.0 + 1), Next::Continue))
        }
    }

    fn unwrap_err(result: Result<CompiledStateGraph<Counter>, CompilationError>) -> CompilationError {
        match result {
            Err(e) => e,
            Ok(_) => panic!("expected compile error"),
        }
    }

    /// **Scenario**: Compile fails when a node has both an outgoing edge and conditional edges.
    #[test]
    fn compile_fails_when_node_has_both_edge_and_conditional() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_node("b", Arc::new(Bump("b")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);
        graph.add_conditional_edges(
            "a",
            Arc::new(|_: &Counter| -> Result<String, AgentError> { Ok("b".to_string()) }),
            None,
        );
        match unwrap_err(graph.compile()) {
            CompilationError::NodeHasBothEdgeAndConditional(id) => assert_eq!(id, "a"),
            e => panic!("expected NodeHasBothEdgeAndConditional(a), got {:?}", e),
        }
    }

    /// **Scenario**: Compile fails when conditional path_map references a non-existent node.
    #[test]
    fn compile_fails_when_conditional_path_map_has_invalid_target() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_edge(START, "a");
        graph.add_conditional_edges(
            "a",
            Arc::new(|_: &Counter| -> Result<String, AgentError> { Ok("x".to_string()) }),
            Some([("x".to_string(), "nonexistent".to_string())].into_iter().collect()),
        );
        match unwrap_err(graph.compile()) {
            CompilationError::InvalidConditionalPathMap(id) => assert_eq!(id, "nonexistent"),
            e => panic!("expected InvalidConditionalPathMap, got {:?}", e),
        }
    }

    #[test]
    fn compile_fails_without_start_edge() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_edge("a", END);
        assert!(matches!(unwrap_err(graph.compile()), CompilationError::MissingStart));
    }

    #[test]
    fn compile_fails_without_end() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_node("b", Arc::new(Bump("b")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        assert!(matches!(unwrap_err(graph.compile()), CompilationError::MissingEnd));
    }

    #[test]
    fn compile_fails_on_unknown_edge_target() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "ghost");
        match unwrap_err(graph.compile()) {
            CompilationError::NodeNotFound(id) => assert_eq!(id, "ghost"),
            e => panic!("expected NodeNotFound, got {:?}", e),
        }
    }

    #[test]
    fn compile_fails_on_branching_plain_edges() {
        let mut graph = StateGraph::<Counter>::new();
        graph.add_node("a", Arc::new(Bump("a")));
        graph.add_node("b", Arc::new(Bump("b")));
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("a", END);
        graph.add_edge("b", END);
        assert!(matches!(
            unwrap_err(graph.compile()),
            CompilationError::InvalidChain(_)
        ));
    }
}
