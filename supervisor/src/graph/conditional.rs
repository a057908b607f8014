//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that takes the merged state and returns a
//! key; the key is used as the next node id, or looked up in an optional path map.
//! Routers are fallible: an `Err` aborts the run and is returned from `invoke` as is.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;

/// Router function: state in, routing key out (or a fatal routing error).
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> Result<String, AgentError> + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// - `path_map == None`: the router's key is the next node id (or END).
/// - `path_map == Some(map)`: next node is `map[key]` when present, else the key itself.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id from the current state.
    pub fn resolve_next(&self, state: &S) -> Result<String, AgentError> {
        let key = (self.path)(state)?;
        Ok(self
            .path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key))
    }

    /// Targets reachable through the path map, sorted; empty without a map.
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .path_map
            .as_ref()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets.dedup();
        targets
    }
}

/// How to determine the next node after a given node runs.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). The node's `Next` is still respected.
    Unconditional(String),
    /// Next node is decided by the router from state; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}
