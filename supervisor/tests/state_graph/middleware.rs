//! Node middleware wraps every node run.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use supervisor::graph::{NodeRunFn, SpanRecorder};
use supervisor::{AgentError, Next, NodeMiddleware, StateGraph, END, START};

use crate::common::{Trail, Visit};

#[derive(Default)]
struct Recording {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl NodeMiddleware<Trail> for Recording {
    async fn around_run(
        &self,
        node_id: &str,
        state: Trail,
        inner: NodeRunFn<Trail>,
    ) -> Result<(Trail, Next), AgentError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(node_id.to_string());
        }
        inner(state).await
    }
}

/// **Scenario**: middleware sees each node id once, in execution order.
#[tokio::test]
async fn middleware_sees_every_node() {
    let recording = Arc::new(Recording::default());
    let mut graph = StateGraph::<Trail>::new().with_middleware(recording.clone());
    graph
        .add_node("a", Arc::new(Visit::new("a")))
        .add_node("b", Arc::new(Visit::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);

    let out = graph.compile().unwrap().invoke(Trail::default(), None).await.unwrap();
    assert_eq!(out.visited, vec!["a", "b"]);
    assert_eq!(*recording.seen.lock().unwrap(), vec!["a", "b"]);
}

/// **Scenario**: a recorder layered onto a compiled graph wraps the original middleware,
/// and the original graph is left untouched.
#[tokio::test]
async fn span_recorder_layers_over_compiled_middleware() {
    let recording = Arc::new(Recording::default());
    let mut graph = StateGraph::<Trail>::new().with_middleware(recording.clone());
    graph
        .add_node("a", Arc::new(Visit::new("a")))
        .add_node("b", Arc::new(Visit::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let compiled = graph.compile().unwrap();

    let recorder = Arc::new(SpanRecorder::new(compiled.middleware()));
    let traced = compiled.with_middleware(recorder.clone());
    traced.invoke(Trail::default(), None).await.unwrap();

    let ids: Vec<String> = recorder.spans().into_iter().map(|s| s.node_id).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(*recording.seen.lock().unwrap(), vec!["a", "b"]);

    compiled.invoke(Trail::default(), None).await.unwrap();
    assert_eq!(recorder.spans().len(), 2);
}
