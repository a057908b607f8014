//! Structured logging for graph execution events.

use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "Starting node execution");
}

/// Logs the input state of a node (trace level: states carry whole conversations).
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

pub fn log_node_complete(node_id: &str, next: &Next) {
    tracing::debug!(node_id = node_id, ?next, "Node execution complete");
}

pub fn log_state_update(node_id: &str) {
    tracing::debug!(node_id = node_id, "State updated");
}

pub fn log_conditional_route(from: &str, to: &str) {
    tracing::debug!(from = from, to = to, "conditional routing");
}

pub fn log_graph_start() {
    tracing::info!("Starting graph execution");
}

pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

pub fn log_graph_error(error: &AgentError) {
    tracing::error!(error = %error, "Graph execution error");
}
