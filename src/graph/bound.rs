use std::collections::HashSet;

use super::Graph;

/// Cut an oversized graph down to `focus` and its direct neighbors.
///
/// Identity unless the graph holds more than `max_nodes` nodes and `focus`
/// resolves to a node (case-insensitively). Neighbors are predecessors then
/// successors, each in edge creation order, and the list is truncated to
/// `max_nodes - 1`. The cut is positional, not ranked by value. Kept nodes and
/// edges retain their full-dataset statistics.
pub fn bound(graph: Graph, focus: Option<&str>, max_nodes: usize) -> Graph {
    if graph.node_count() <= max_nodes {
        return graph;
    }
    let Some(focus) = focus.map(str::trim).filter(|f| !f.is_empty()) else {
        return graph;
    };
    let Some(focus) = graph.resolve_address(focus) else {
        return graph;
    };

    let budget = max_nodes.saturating_sub(1);
    let mut keep: HashSet<&str> = HashSet::with_capacity(budget + 1);
    keep.insert(focus);

    let neighbors = graph.predecessors(focus).chain(graph.successors(focus));
    let mut taken = 0;
    for neighbor in neighbors {
        if taken == budget {
            break;
        }
        // Self loops and nodes that are both predecessor and successor count once.
        if keep.insert(neighbor) {
            taken += 1;
        }
    }

    graph.induced_subgraph(&keep)
}
