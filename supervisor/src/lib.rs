//! # Supervisor
//!
//! A three-node decision graph that classifies a conversation turn and then either
//! answers it or asks a clarifying question, plus the glue that publishes the graph as a
//! versioned model and points a serving endpoint at it.
//!
//! ```text
//! START → supervisor ─┬─ respond → generate_response ──────→ END
//!                     └─ clarify → generate_clarification ─→ END
//! ```
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], [`RunContext`]: build and run state graphs.
//! - [`agent`]: [`ClassifyNode`], [`RespondNode`], [`ClarifyNode`], [`route`], [`build_supervisor_graph`].
//! - [`state`]: [`SupervisorState`], [`Decision`], [`ClassifierStep`], [`SupervisorStateUpdater`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`].
//! - [`lifecycle`]: [`infer_signature`], [`publish`], [`deploy`], registry and serving clients.
//! - [`message`]: [`Message`] (System / User / Assistant).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use supervisor::{build_supervisor_graph, InvocationRequest, Message, MockLlm, RunnableConfig, SupervisorLlms};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let llms = SupervisorLlms {
//!     classifier: Arc::new(MockLlm::new(r#"{"decision": "respond"}"#)),
//!     responder: Arc::new(MockLlm::new("2 + 2 = 4, Alice.")),
//!     clarifier: Arc::new(MockLlm::new("Could you say more?")),
//!     repair_attempts: 0,
//! };
//! let graph = build_supervisor_graph(llms)?;
//! let out = graph
//!     .invoke_payload(
//!         InvocationRequest::new(vec![Message::user("What's 2+2?")]),
//!         Some(RunnableConfig::new().with("name", "Alice")),
//!     )
//!     .await?;
//! assert_eq!(out.messages.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod channels;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod runnable_config;
pub mod state;

pub use agent::{
    build_supervisor_graph, parse_classifier_reply, route, ClarifyNode, ClassifyNode,
    InvocationRequest, InvocationResponse, RespondNode, SupervisorGraph, SupervisorLlms,
    CLARIFY_NODE, DEFAULT_ADDRESSEE, NAME_KEY, RESPOND_NODE, SUPERVISOR_NODE,
};
pub use channels::{BoxedStateUpdater, ReplaceUpdater, StateUpdater};
pub use error::{AgentError, ClassificationError, InvalidDecisionError, ParseError};
pub use graph::{
    generate_dot, generate_text, CompilationError, CompiledStateGraph, LoggingNodeMiddleware,
    Next, Node, NodeMiddleware, NodeSpan, RunContext, SpanRecorder, StateGraph, END, START,
};
pub use lifecycle::{
    deploy, infer_signature, publish, ArtifactHandle, ArtifactRegistry, DatabricksServing,
    EndpointStatus, InMemoryRegistry, InMemoryServing, LifecycleError, MlflowRegistry,
    ModelArtifact, RegistrationError, ServedEntity, ServingClient, ServingError, Signature,
    WorkloadSize,
};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use message::Message;
pub use runnable_config::RunnableConfig;
pub use state::{ClassifierStep, Decision, SupervisorState, SupervisorStateUpdater};
