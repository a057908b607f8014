//! Run-scoped context handed to `Node::run_with_context`.

use crate::runnable_config::RunnableConfig;

/// Per-invocation context: currently the read-only [`RunnableConfig`].
///
/// Built once by `CompiledStateGraph::invoke` and shared by reference with every node.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config: RunnableConfig,
}

impl RunContext {
    pub fn new(config: RunnableConfig) -> Self {
        Self { config }
    }
}
