//! Next-step result from a graph node: continue along the edge, jump to a node, or end.

/// Next step after running a node.
///
/// - **Continue**: follow the node's outgoing edge (plain or conditional).
/// - **Node(id)**: jump to the given node; ignored when the node has conditional edges.
/// - **End**: stop and return the current state; ignored when the node has conditional edges.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    Continue,
    Node(String),
    End,
}
