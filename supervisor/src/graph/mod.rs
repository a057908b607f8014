//! State graph: nodes, plain and conditional edges, compile and invoke.
//!
//! `StateGraph` is the builder; `compile()` validates it into an immutable
//! `CompiledStateGraph` that is invoked once per conversation turn.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod logging_middleware;
mod next;
mod node;
mod node_middleware;
mod run_context;
mod span_middleware;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, DEFAULT_STEP_LIMIT};
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeMiddleware, NodeRunFn};
pub use run_context::RunContext;
pub use span_middleware::{NodeSpan, SpanRecorder};
pub use state_graph::{StateGraph, END, START};
pub use visualization::{generate_dot, generate_text};
