//! Tests for the topological execution sequencer.
mod common;
use common::*;
use flowforge::prelude::*;

fn position_of(order: &[usize], graph: &WorkflowGraph, node_id: &str) -> usize {
    let index = graph
        .nodes
        .iter()
        .position(|n| n.id == node_id)
        .expect("node exists");
    order.iter().position(|&i| i == index).expect("node ordered")
}

#[test]
fn linear_graph_orders_by_dependency() {
    let graph = simple_graph();
    let order = execution_order(&graph);
    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn order_is_a_permutation_of_the_node_set() {
    let graph = diamond_graph();
    let mut order = execution_order(&graph);
    order.sort_unstable();
    assert_eq!(order, (0..graph.nodes.len()).collect::<Vec<_>>());
}

#[test]
fn every_edge_points_forward() {
    let graph = diamond_graph();
    let order = execution_order(&graph);
    for edge in &graph.edges {
        let source = position_of(&order, &graph, &edge.source);
        let target = position_of(&order, &graph, &edge.target);
        assert!(
            source < target,
            "edge {} -> {} violates the order",
            edge.source,
            edge.target
        );
    }
}

#[test]
fn ties_break_by_declaration_order() {
    // Two independent roots feeding one sink; the first declared root must
    // come first even though both are ready simultaneously.
    let graph = WorkflowGraph {
        id: "wf-ties".to_string(),
        name: "Ties".to_string(),
        nodes: vec![
            Node::new("rootB", "entry"),
            Node::new("rootA", "entry"),
            Node::new("sink", "return"),
        ],
        edges: vec![
            Edge::new("e1", "rootB", "sink"),
            Edge::new("e2", "rootA", "sink"),
        ],
    };

    let order = execution_order(&graph);
    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn cyclic_graph_falls_back_to_declaration_order() {
    // Deliberate fail-open: a cycle cannot be ordered, so the sequencer
    // returns the nodes exactly as declared instead of failing.
    let graph = cyclic_graph();
    let order = execution_order(&graph);
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn repeated_runs_are_stable() {
    let graph = diamond_graph();
    assert_eq!(execution_order(&graph), execution_order(&graph));
}
