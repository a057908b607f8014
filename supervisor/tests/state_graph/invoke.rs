//! StateGraph invoke: chains, conditional routing, errors, step limit.

use std::collections::HashMap;
use std::sync::Arc;

use supervisor::{generate_text, AgentError, Next, StateGraph, END, START};

use crate::common::{Failing, Trail, Visit};

/// **Scenario**: a two-node chain visits both nodes in order with the default replace updater.
#[tokio::test]
async fn invoke_linear_chain() {
    let mut graph = StateGraph::<Trail>::new();
    graph
        .add_node("a", Arc::new(Visit::new("a")))
        .add_node("b", Arc::new(Visit::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);

    let out = graph.compile().unwrap().invoke(Trail::default(), None).await.unwrap();
    assert_eq!(out.visited, vec!["a", "b"]);
    assert_eq!(out.count, 2);
}

/// **Scenario**: the router's key is mapped through the path map to the next node.
#[tokio::test]
async fn conditional_edge_uses_path_map() {
    let mut graph = StateGraph::<Trail>::new();
    graph
        .add_node("decide", Arc::new(Visit::new("decide")))
        .add_node("left", Arc::new(Visit::new("left")))
        .add_node("right", Arc::new(Visit::new("right")))
        .add_edge(START, "decide")
        .add_conditional_edges(
            "decide",
            Arc::new(|s: &Trail| -> Result<String, AgentError> {
                Ok(if s.count % 2 == 1 { "odd" } else { "even" }.to_string())
            }),
            Some(HashMap::from([
                ("odd".to_string(), "left".to_string()),
                ("even".to_string(), "right".to_string()),
            ])),
        )
        .add_edge("left", END)
        .add_edge("right", END);

    let compiled = graph.compile().unwrap();
    let out = compiled.invoke(Trail::default(), None).await.unwrap();
    assert_eq!(out.visited, vec!["decide", "left"]);

    let text = generate_text(&compiled);
    assert!(text.contains("decide -?-> left"), "{}", text);
    assert!(text.contains("decide -?-> right"), "{}", text);
}

/// **Scenario**: a router error aborts the run and comes back unchanged.
#[tokio::test]
async fn router_error_is_returned_unchanged() {
    let mut graph = StateGraph::<Trail>::new();
    graph
        .add_node("decide", Arc::new(Visit::new("decide")))
        .add_node("next", Arc::new(Visit::new("next")))
        .add_edge(START, "decide")
        .add_conditional_edges(
            "decide",
            Arc::new(|_: &Trail| -> Result<String, AgentError> {
                Err(AgentError::ExecutionFailed("no route".into()))
            }),
            Some(HashMap::from([("next".to_string(), "next".to_string())])),
        )
        .add_edge("next", END);

    let err = graph
        .compile()
        .unwrap()
        .invoke(Trail::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ExecutionFailed(ref m) if m == "no route"));
}

/// **Scenario**: Next::End from a node stops the run before its plain edge.
#[tokio::test]
async fn next_end_stops_early() {
    let mut graph = StateGraph::<Trail>::new();
    graph
        .add_node("a", Arc::new(Visit::with_next("a", Next::End)))
        .add_node("b", Arc::new(Visit::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);

    let out = graph.compile().unwrap().invoke(Trail::default(), None).await.unwrap();
    assert_eq!(out.visited, vec!["a"]);
}

/// **Scenario**: a cycle is stopped by the step limit.
#[tokio::test]
async fn cycle_hits_step_limit() {
    let mut graph = StateGraph::<Trail>::new().with_step_limit(5);
    graph
        .add_node("loop", Arc::new(Visit::new("loop")))
        .add_edge(START, "loop")
        .add_conditional_edges(
            "loop",
            Arc::new(|_: &Trail| -> Result<String, AgentError> { Ok("loop".to_string()) }),
            Some(HashMap::from([
                ("loop".to_string(), "loop".to_string()),
                ("done".to_string(), END.to_string()),
            ])),
        );

    let err = graph
        .compile()
        .unwrap()
        .invoke(Trail::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ExecutionFailed(ref m) if m.contains("step limit of 5")));
}

/// **Scenario**: a node error stops the run and is returned.
#[tokio::test]
async fn node_error_propagates() {
    let mut graph = StateGraph::<Trail>::new();
    graph
        .add_node("failing", Arc::new(Failing))
        .add_edge(START, "failing")
        .add_edge("failing", END);

    let err = graph
        .compile()
        .unwrap()
        .invoke(Trail::default(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("always fails"));
}
