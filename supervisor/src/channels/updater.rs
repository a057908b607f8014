//! State updater: merge a node's output into the current state.
//!
//! Per-field strategies (append a list, overwrite a scalar) are expressed by
//! implementing `StateUpdater` for the state type:
//!
//! ```rust,ignore
//! impl StateUpdater<MyState> for MyUpdater {
//!     fn apply_update(&self, current: &mut MyState, update: &MyState) {
//!         current.messages.extend(update.messages.iter().cloned());
//!         current.count = update.count;
//!     }
//! }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

/// Merges a node's returned state (`update`) into `current`.
///
/// Called by the compiled graph after every node. Default is [`ReplaceUpdater`].
pub trait StateUpdater<S>: Send + Sync + Debug
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S);
}

/// The node's return value completely replaces the previous state.
#[derive(Debug, Clone, Default)]
pub struct ReplaceUpdater;

impl<S> StateUpdater<S> for ReplaceUpdater
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        *current = update.clone();
    }
}

/// Type-erased updater stored by `StateGraph` and `CompiledStateGraph`.
pub type BoxedStateUpdater<S> = Arc<dyn StateUpdater<S>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Transcript {
        lines: Vec<String>,
        turn: u32,
    }

    #[test]
    fn replace_updater_replaces_whole_state() {
        let updater: BoxedStateUpdater<Transcript> = Arc::new(ReplaceUpdater);
        let mut current = Transcript {
            lines: vec!["old".into()],
            turn: 1,
        };
        let update = Transcript {
            lines: vec!["new".into()],
            turn: 2,
        };
        updater.apply_update(&mut current, &update);
        assert_eq!(current, update);
    }
}
