//! Graph visualization: text summary and Graphviz DOT export.
//!
//! Output is deterministic (nodes and edges sorted) so it can be stored as artifact metadata.

use std::fmt::{Debug, Write};

use super::{CompiledStateGraph, NextEntry, END, START};

/// Edges as (from, to, conditional), sorted; conditional edges without a path map are omitted.
fn edges<S>(graph: &CompiledStateGraph<S>) -> Vec<(String, String, bool)>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut out = vec![(START.to_string(), graph.first_node_id.clone(), false)];
    let mut rest: Vec<(String, String, bool)> = graph
        .next_map
        .iter()
        .flat_map(|(from, entry)| match entry {
            NextEntry::Unconditional(to) => vec![(from.clone(), to.clone(), false)],
            NextEntry::Conditional(router) => router
                .targets()
                .into_iter()
                .map(|to| (from.clone(), to, true))
                .collect(),
        })
        .collect();
    rest.sort();
    out.extend(rest);
    out
}

/// Graphviz DOT representation; conditional edges are dashed.
pub fn generate_dot<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut dot = String::from("digraph {\n  rankdir=LR;\n  node [shape=box];\n\n");
    let _ = writeln!(dot, "  \"{}\" [label=\"START\", style=bold];", START);
    let _ = writeln!(dot, "  \"{}\" [label=\"END\", style=bold];", END);
    for id in graph.node_ids() {
        let _ = writeln!(dot, "  \"{}\";", id);
    }
    dot.push('\n');
    for (from, to, conditional) in edges(graph) {
        if conditional {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\" [style=dashed];", from, to);
        } else {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", from, to);
        }
    }
    dot.push_str("}\n");
    dot
}

/// Plain-text summary: node list followed by one line per edge (`-?->` for conditional).
pub fn generate_text<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut text = String::new();
    let ids = graph.node_ids();
    let _ = writeln!(text, "Nodes ({}): {}", ids.len(), ids.join(", "));
    let _ = writeln!(text, "Edges:");
    for (from, to, conditional) in edges(graph) {
        let arrow = if conditional { "-?->" } else { "-->" };
        let _ = writeln!(text, "  {} {} {}", from, arrow, to);
    }
    text
}
