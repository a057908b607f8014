//! Middleware that keeps one span per node run, for attaching a run's trace to a
//! published model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::AgentError;

use super::node_middleware::NodeRunFn;
use super::{Next, NodeMiddleware};

/// One node execution: offset from the first node start, duration and outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpan {
    pub node_id: String,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub ok: bool,
}

/// Records a [`NodeSpan`] for every node it wraps, then delegates to `inner` (when set).
///
/// A graph has a single middleware slot, so the recorder wraps whatever was installed
/// there (e.g. [`LoggingNodeMiddleware`](super::LoggingNodeMiddleware)). Use one
/// recorder per invocation; spans from concurrent runs would interleave.
pub struct SpanRecorder<S> {
    inner: Option<Arc<dyn NodeMiddleware<S>>>,
    origin: Mutex<Option<Instant>>,
    spans: Mutex<Vec<NodeSpan>>,
}

impl<S> SpanRecorder<S> {
    pub fn new(inner: Option<Arc<dyn NodeMiddleware<S>>>) -> Self {
        Self {
            inner,
            origin: Mutex::new(None),
            spans: Mutex::new(Vec::new()),
        }
    }

    /// Spans recorded so far, in execution order.
    pub fn spans(&self) -> Vec<NodeSpan> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn offset_ms(&self, now: Instant) -> u64 {
        match self.origin.lock() {
            Ok(mut origin) => {
                let origin = *origin.get_or_insert(now);
                now.duration_since(origin).as_millis() as u64
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for SpanRecorder<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError> {
        let started = Instant::now();
        let start_ms = self.offset_ms(started);
        let result = match &self.inner {
            Some(middleware) => middleware.around_run(node_id, state, inner).await,
            None => inner(state).await,
        };
        let span = NodeSpan {
            node_id: node_id.to_string(),
            start_ms,
            duration_ms: started.elapsed().as_millis() as u64,
            ok: result.is_ok(),
        };
        tracing::trace!(node_id, duration_ms = span.duration_ms, ok = span.ok, "span recorded");
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span);
        }
        result
    }
}
