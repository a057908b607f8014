//! Builds the compiled supervisor graph from three language-model clients.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;
use crate::graph::{
    generate_dot, generate_text, CompilationError, CompiledStateGraph, LoggingNodeMiddleware,
    NodeSpan, SpanRecorder, StateGraph, END, START,
};
use crate::llm::{ChatOpenAI, LlmClient, DEFAULT_MODEL};
use crate::runnable_config::RunnableConfig;
use crate::state::{SupervisorState, SupervisorStateUpdater};

use super::payload::{InvocationRequest, InvocationResponse};
use super::router::{route, CLARIFY_NODE, RESPOND_NODE, SUPERVISOR_NODE};
use super::{ClarifyNode, ClassifyNode, RespondNode};

/// Model clients for the three nodes.
#[derive(Clone)]
pub struct SupervisorLlms {
    pub classifier: Arc<dyn LlmClient>,
    pub responder: Arc<dyn LlmClient>,
    pub clarifier: Arc<dyn LlmClient>,
    /// Extra classifier calls after an unparsable reply.
    pub repair_attempts: usize,
}

impl SupervisorLlms {
    /// One client for all three nodes.
    pub fn shared(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            classifier: llm.clone(),
            responder: llm.clone(),
            clarifier: llm,
            repair_attempts: 0,
        }
    }

    /// `gpt-4o-mini` at temperature 0 for every node; credentials from the environment.
    pub fn openai() -> Self {
        Self::shared(Arc::new(ChatOpenAI::new(DEFAULT_MODEL).with_temperature(0.0)))
    }

    pub fn with_repair_attempts(mut self, attempts: usize) -> Self {
        self.repair_attempts = attempts;
        self
    }
}

/// Compiles `START → supervisor → {generate_response | generate_clarification} → END`.
///
/// Every call returns a new, independent graph.
pub fn build_supervisor_graph(llms: SupervisorLlms) -> Result<SupervisorGraph, CompilationError> {
    let classify = ClassifyNode::new(llms.classifier).with_repair_attempts(llms.repair_attempts);

    let mut graph = StateGraph::<SupervisorState>::new()
        .with_state_updater(Arc::new(SupervisorStateUpdater))
        .with_middleware(Arc::new(LoggingNodeMiddleware::<SupervisorState>::default()));
    graph
        .add_node(SUPERVISOR_NODE, Arc::new(classify))
        .add_node(RESPOND_NODE, Arc::new(RespondNode::new(llms.responder)))
        .add_node(CLARIFY_NODE, Arc::new(ClarifyNode::new(llms.clarifier)))
        .add_edge(START, SUPERVISOR_NODE)
        .add_conditional_edges(
            SUPERVISOR_NODE,
            Arc::new(|s: &SupervisorState| {
                route(s).map(str::to_string).map_err(AgentError::from)
            }),
            Some(HashMap::from([
                (RESPOND_NODE.to_string(), RESPOND_NODE.to_string()),
                (CLARIFY_NODE.to_string(), CLARIFY_NODE.to_string()),
            ])),
        )
        .add_edge(RESPOND_NODE, END)
        .add_edge(CLARIFY_NODE, END);

    Ok(SupervisorGraph {
        inner: graph.compile()?,
    })
}

/// The compiled supervisor graph. Immutable; safe to share across invocations.
#[derive(Clone)]
pub struct SupervisorGraph {
    inner: CompiledStateGraph<SupervisorState>,
}

impl SupervisorGraph {
    /// Runs one conversation turn. Errors from any node or the router are returned
    /// unchanged and no partial state is produced.
    pub async fn invoke(
        &self,
        state: SupervisorState,
        config: Option<RunnableConfig>,
    ) -> Result<SupervisorState, AgentError> {
        self.inner.invoke(state, config).await
    }

    /// Payload-level entry point used by serving.
    pub async fn invoke_payload(
        &self,
        request: InvocationRequest,
        config: Option<RunnableConfig>,
    ) -> Result<InvocationResponse, AgentError> {
        let state = self.invoke(request.into(), config).await?;
        Ok(state.into())
    }

    /// Like [`invoke_payload`](Self::invoke_payload), also returning one span per node run.
    ///
    /// The recorder is private to this call and wraps the graph's logging middleware.
    pub async fn invoke_traced(
        &self,
        request: InvocationRequest,
        config: Option<RunnableConfig>,
    ) -> Result<(InvocationResponse, Vec<NodeSpan>), AgentError> {
        let recorder = Arc::new(SpanRecorder::new(self.inner.middleware()));
        let traced = self.inner.with_middleware(recorder.clone());
        let state = traced.invoke(request.into(), config).await?;
        Ok((state.into(), recorder.spans()))
    }

    /// Text description of nodes and edges.
    pub fn describe(&self) -> String {
        generate_text(&self.inner)
    }

    pub fn to_dot(&self) -> String {
        generate_dot(&self.inner)
    }

    pub fn compiled(&self) -> &CompiledStateGraph<SupervisorState> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    #[test]
    fn graph_has_three_nodes_entered_at_supervisor() {
        let graph = build_supervisor_graph(SupervisorLlms::shared(Arc::new(MockLlm::new("x"))))
            .unwrap();
        assert_eq!(
            graph.compiled().node_ids(),
            vec![CLARIFY_NODE, RESPOND_NODE, SUPERVISOR_NODE]
        );
        assert_eq!(graph.compiled().entry_node(), SUPERVISOR_NODE);
    }

    /// **Scenario**: a traced respond turn yields spans for the classifier then the responder.
    #[tokio::test]
    async fn traced_invoke_records_node_spans() {
        let graph = build_supervisor_graph(SupervisorLlms {
            classifier: Arc::new(MockLlm::new(r#"{"decision":"respond","reasoning":"hi"}"#)),
            responder: Arc::new(MockLlm::new("Hello!")),
            clarifier: Arc::new(MockLlm::new("?")),
            repair_attempts: 0,
        })
        .unwrap();
        let (response, spans) = graph
            .invoke_traced(InvocationRequest::sample(), None)
            .await
            .unwrap();
        assert_eq!(response.messages.last().map(|m| m.content()), Some("Hello!"));
        let ids: Vec<&str> = spans.iter().map(|s| s.node_id.as_str()).collect();
        assert_eq!(ids, vec![SUPERVISOR_NODE, RESPOND_NODE]);
        assert!(spans.iter().all(|s| s.ok));
    }

    #[test]
    fn description_lists_both_routes() {
        let graph = build_supervisor_graph(SupervisorLlms::shared(Arc::new(MockLlm::new("x"))))
            .unwrap();
        let text = graph.describe();
        assert!(text.contains(RESPOND_NODE));
        assert!(text.contains(CLARIFY_NODE));
        assert!(graph.to_dot().contains("style=dashed"));
    }
}
