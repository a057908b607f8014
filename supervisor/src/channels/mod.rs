//! How node outputs are merged into graph state.
//!
//! - `ReplaceUpdater`: default, the node output replaces the state.
//! - Custom merges implement `StateUpdater` (see `state::SupervisorStateUpdater`).

mod updater;

pub use updater::{BoxedStateUpdater, ReplaceUpdater, StateUpdater};
