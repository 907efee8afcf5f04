use std::collections::VecDeque;

use ahash::AHashMap;

use crate::graph::WorkflowGraph;

/// Computes the execution order of the graph's nodes as indices into
/// `graph.nodes`, using Kahn's algorithm.
///
/// Ties are broken by declaration order: the ready queue is seeded by node
/// array position, and neighbors are enqueued in the order their edges were
/// declared. For a cyclic graph the ordering cannot place every node, and the
/// function falls back to the unchanged declaration order instead of failing;
/// callers that want to reject cycles must check the validation report first.
pub fn execution_order(graph: &WorkflowGraph) -> Vec<usize> {
    let total = graph.nodes.len();
    let index_of: AHashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); total];
    let mut in_degree: Vec<usize> = vec![0; total];
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (
            index_of.get(edge.source.as_str()),
            index_of.get(edge.target.as_str()),
        ) {
            adjacency[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..total).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(total);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &adjacency[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < total {
        // Cycle: fall back to declaration order.
        return (0..total).collect();
    }

    order
}
